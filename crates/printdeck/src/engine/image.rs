use strum::Display;

/// Illustration assets shipped for the supported printer families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PrinterImage {
    #[strum(serialize = "k1.png")]
    K1,
    #[strum(serialize = "k1max.png")]
    K1Max,
    #[strum(serialize = "k1c.png")]
    K1C,
    #[strum(serialize = "k2plus.png")]
    K2Plus,
}

impl PrinterImage {
    /// Pick the illustration for a model string, falling back to the printer
    /// key when no model is known. Never fails: anything unrecognised is
    /// drawn as a K1.
    pub fn guess(model: Option<&str>, key: &str) -> Self {
        let model = model.filter(|m| !m.is_empty()).unwrap_or(key);
        let model = model.to_lowercase();

        if model.contains("k2plus") {
            PrinterImage::K2Plus
        } else if model.contains("k1_max") {
            PrinterImage::K1Max
        } else if model.contains("k1c") {
            PrinterImage::K1C
        } else {
            // Plain "k1" and everything unrecognised share the K1 image.
            PrinterImage::K1
        }
    }
}
