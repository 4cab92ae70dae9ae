use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::listing::Listing;

pub const COLUMNS: [&str; 8] = [
    "Price", "Year", "Make", "Model", "Location", "Mileage", "Link", "VIN",
];

/// Final row set: listings with a VIN, in resolver order.
pub fn assemble(listings: Vec<Listing>) -> Vec<Listing> {
    listings.into_iter().filter(|l| l.vin.is_some()).collect()
}

fn record(listing: &Listing) -> [String; 8] {
    [
        listing.price.clone(),
        listing.year.to_string(),
        listing.brand.clone(),
        listing.model.clone(),
        listing.location.clone(),
        listing.mileage.to_string(),
        listing.link.clone(),
        listing.vin.clone().unwrap_or_default(),
    ]
}

/// Write the header and one record per listing.
pub fn write_csv<W: Write>(writer: W, rows: &[Listing]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.write_record(record(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Create or truncate `path` and write the table to it.
pub fn write_file(path: impl AsRef<Path>, rows: &[Listing]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, rows)?;
    info!("Data has been written to {} ({} rows)", path.display(), rows.len());
    Ok(())
}
