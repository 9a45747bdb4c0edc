//! Inventory report.

use super::csv_line;
use crate::models::{Medicine, ValidationError, ValidationResult};
use crate::totals::format_amount;

pub const INVENTORY_HEADER: [&str; 11] = [
    "Medicine Name",
    "Strength",
    "Type",
    "Pack Purchase Rate",
    "Pack Retail Rate",
    "Units Per Pack",
    "Total Packs",
    "Total Units Available",
    "Stock Status",
    "Purchase/Unit",
    "Retail/Unit",
];

/// Render one row per medicine with its stock status at `low_stock_threshold`.
pub fn inventory_csv(medicines: &[Medicine], low_stock_threshold: u32) -> ValidationResult<String> {
    if medicines.is_empty() {
        return Err(ValidationError::NothingToExport);
    }

    let mut csv = csv_line(INVENTORY_HEADER);
    for med in medicines {
        csv.push_str(&csv_line([
            med.name.clone(),
            med.strength.clone(),
            med.form.to_string(),
            format_amount(med.pack_purchase_rate),
            format_amount(med.pack_retail_rate),
            med.units_per_pack.to_string(),
            med.total_packs().to_string(),
            med.total_units.to_string(),
            med.stock_status(low_stock_threshold).label().to_string(),
            format_amount(med.purchase_per_unit()),
            format_amount(med.retail_per_unit()),
        ]));
    }
    Ok(csv)
}
