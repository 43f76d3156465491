use image::ImageFormat;

/// Detect the container format of raw image bytes from their magic numbers
///
/// Returns the canonical file extension ("png", "jpeg", "bmp", ...) or None
/// if the bytes are not a recognised image container. Nothing is decoded.
pub fn detect_format(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    extension(format)
}

fn extension(format: ImageFormat) -> Option<&'static str> {
    format.extensions_str().first().copied()
}

/// Pick a file name for an image payload, e.g. `clip-0003.png`
/// Unknown containers get a `.bin` extension
pub fn file_name(stem: &str, bytes: &[u8]) -> String {
    format!("{}.{}", stem, detect_format(bytes).unwrap_or("bin"))
}
