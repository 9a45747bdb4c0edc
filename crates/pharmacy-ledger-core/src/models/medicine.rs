//! Inventory medicine models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{check_amount, now_timestamp, required, ValidationError, ValidationResult};

/// Default stock level below which a medicine is reported as low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Physical form a medicine is sold in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DosageForm {
    #[default]
    Tablet,
    Capsule,
    Syrup,
    Injection,
    Drops,
    Cream,
    Ointment,
}

impl DosageForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DosageForm::Tablet => "Tablet",
            DosageForm::Capsule => "Capsule",
            DosageForm::Syrup => "Syrup",
            DosageForm::Injection => "Injection",
            DosageForm::Drops => "Drops",
            DosageForm::Cream => "Cream",
            DosageForm::Ointment => "Ointment",
        }
    }

    /// Parse a form name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tablet" => Some(DosageForm::Tablet),
            "capsule" => Some(DosageForm::Capsule),
            "syrup" => Some(DosageForm::Syrup),
            "injection" => Some(DosageForm::Injection),
            "drops" => Some(DosageForm::Drops),
            "cream" => Some(DosageForm::Cream),
            "ointment" => Some(DosageForm::Ointment),
            _ => None,
        }
    }
}

impl fmt::Display for DosageForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived stock status of a medicine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::InStock => "In Stock",
        }
    }
}

/// A medicine held in inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    /// Unique identifier
    pub id: String,
    /// Brand or generic name
    pub name: String,
    /// Strength as printed on the pack (e.g., "500mg", "120ml")
    pub strength: String,
    /// Dosage form
    pub form: DosageForm,
    /// Purchase price of one pack
    pub pack_purchase_rate: f64,
    /// Retail price of one pack
    pub pack_retail_rate: f64,
    /// Units (tablets, ampoules, bottles) in one pack
    pub units_per_pack: u32,
    /// Current stock in units; the authoritative quantity
    pub total_units: u32,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Medicine {
    /// Whole packs in stock.
    pub fn total_packs(&self) -> u32 {
        self.total_units / self.units_per_pack
    }

    /// Purchase price of a single unit.
    pub fn purchase_per_unit(&self) -> f64 {
        self.pack_purchase_rate / f64::from(self.units_per_pack)
    }

    /// Retail price of a single unit.
    pub fn retail_per_unit(&self) -> f64 {
        self.pack_retail_rate / f64::from(self.units_per_pack)
    }

    /// Display name used on line items and reports.
    pub fn full_name(&self) -> String {
        format!("{} {} ({})", self.name, self.strength, self.form)
    }

    /// Stock status for the given low-stock threshold.
    pub fn stock_status(&self, low_stock_threshold: u32) -> StockStatus {
        if self.total_units == 0 {
            StockStatus::OutOfStock
        } else if self.total_units < low_stock_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// Check whether a search query matches "name strength".
    pub fn matches(&self, query: &str) -> bool {
        let haystack = format!("{} {}", self.name, self.strength).to_lowercase();
        haystack.contains(&query.trim().to_lowercase())
    }

    /// Replace descriptive and pricing fields, leaving stock untouched.
    pub fn apply_details(&mut self, details: MedicineDetails) -> ValidationResult<()> {
        let validated = details.validate()?;
        self.name = validated.name;
        self.strength = validated.strength;
        self.form = validated.form;
        self.pack_purchase_rate = validated.pack_purchase_rate;
        self.pack_retail_rate = validated.pack_retail_rate;
        self.units_per_pack = validated.units_per_pack;
        self.touch();
        Ok(())
    }

    /// Units added by restocking the given number of packs.
    pub fn units_for_packs(&self, packs: u32) -> u64 {
        u64::from(packs) * u64::from(self.units_per_pack)
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }
}

/// Descriptive and pricing fields of a medicine, as entered on the form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineDetails {
    pub name: String,
    pub strength: String,
    pub form: DosageForm,
    pub pack_purchase_rate: f64,
    pub pack_retail_rate: f64,
    pub units_per_pack: u32,
}

impl MedicineDetails {
    fn validate(self) -> ValidationResult<Self> {
        if self.units_per_pack == 0 {
            return Err(ValidationError::InvalidPackSize);
        }
        Ok(Self {
            name: required("name", &self.name)?,
            strength: required("strength", &self.strength)?,
            form: self.form,
            pack_purchase_rate: check_amount("pack purchase rate", self.pack_purchase_rate)?,
            pack_retail_rate: check_amount("pack retail rate", self.pack_retail_rate)?,
            units_per_pack: self.units_per_pack,
        })
    }
}

/// A medicine about to be added to inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMedicine {
    #[serde(flatten)]
    pub details: MedicineDetails,
    /// Packs on hand when the medicine is first added
    pub packs: u32,
}

impl NewMedicine {
    /// Validate and build the inventory item.
    pub fn validate(self) -> ValidationResult<Medicine> {
        let details = self.details.validate()?;
        let total_units = self
            .packs
            .checked_mul(details.units_per_pack)
            .ok_or(ValidationError::InvalidAmount {
                field: "packs",
                value: self.packs.to_string(),
            })?;
        let now = now_timestamp();
        Ok(Medicine {
            id: uuid::Uuid::new_v4().to_string(),
            name: details.name,
            strength: details.strength,
            form: details.form,
            pack_purchase_rate: details.pack_purchase_rate,
            pack_retail_rate: details.pack_retail_rate,
            units_per_pack: details.units_per_pack,
            total_units,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

/// One entry of a bulk inventory import, in the seed-file layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicineSeed {
    pub name: String,
    pub strength: String,
    #[serde(rename = "type")]
    pub form: String,
    pub pack_purchase_rate: f64,
    pub pack_retail_rate: f64,
    pub units_per_pack: u32,
    #[serde(default)]
    pub initial_packs: u32,
}

impl TryFrom<MedicineSeed> for NewMedicine {
    type Error = ValidationError;

    fn try_from(seed: MedicineSeed) -> Result<Self, Self::Error> {
        let form = DosageForm::parse(&seed.form)
            .ok_or_else(|| ValidationError::UnknownForm(seed.form.clone()))?;
        Ok(NewMedicine {
            details: MedicineDetails {
                name: seed.name,
                strength: seed.strength,
                form,
                pack_purchase_rate: seed.pack_purchase_rate,
                pack_retail_rate: seed.pack_retail_rate,
                units_per_pack: seed.units_per_pack,
            },
            packs: seed.initial_packs,
        })
    }
}
