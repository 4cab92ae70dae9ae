/// Model name used when a title carries only year and make.
pub const NO_MODEL: &str = "No Model Name";

/// One marketplace card as collected: its visible text plus the detail link.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub text: String,
    pub link: String,
}

impl RawCandidate {
    pub fn new(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
        }
    }

    /// Card text with the link appended as its final line.
    pub fn joined(&self) -> String {
        format!("{}\n{}", self.text, self.link)
    }
}

/// A parsed vehicle row. `vin` is filled in by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub price: String,
    pub year: i32,
    pub brand: String,
    pub model: String,
    pub location: String,
    /// Absolute miles (the card shows thousands).
    pub mileage: f64,
    pub link: String,
    pub vin: Option<String>,
}

impl Listing {
    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.brand, self.model)
    }
}
