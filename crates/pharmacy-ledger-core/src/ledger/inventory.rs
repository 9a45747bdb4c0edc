//! Inventory operations.

use super::{Ledger, LedgerError, LedgerResult};
use crate::models::{
    LineItem, Medicine, MedicineDetails, MedicineSeed, NewMedicine, StockStatus, ValidationError,
};
use crate::store::{LedgerStore, Write, WriteBatch};

impl<S: LedgerStore> Ledger<S> {
    /// Add a medicine with its opening stock.
    pub fn add_medicine(&mut self, new: NewMedicine) -> LedgerResult<Medicine> {
        let medicine = new.validate()?;
        self.commit(vec![Write::PutMedicine(medicine.clone())].into())?;
        tracing::info!(
            medicine_id = %medicine.id,
            name = %medicine.full_name(),
            units = medicine.total_units,
            "Added medicine"
        );
        Ok(medicine)
    }

    /// Change name, strength, form, rates or pack size. Stock is unchanged.
    pub fn update_medicine(&mut self, id: &str, details: MedicineDetails) -> LedgerResult<Medicine> {
        let mut medicine = self.require_medicine(id)?;
        medicine.apply_details(details)?;
        self.commit(vec![Write::PutMedicine(medicine.clone())].into())?;
        tracing::info!(medicine_id = %medicine.id, "Updated medicine details");
        Ok(medicine)
    }

    /// Add whole packs to stock.
    pub fn restock(&mut self, id: &str, packs: u32) -> LedgerResult<Medicine> {
        let medicine = self.require_medicine(id)?;
        if packs == 0 {
            return Err(ValidationError::InvalidQuantity.into());
        }
        let added = medicine.units_for_packs(packs);
        let total = u64::from(medicine.total_units) + added;
        if total > u64::from(u32::MAX) {
            return Err(ValidationError::InvalidAmount {
                field: "packs",
                value: packs.to_string(),
            }
            .into());
        }

        let delta = i64::try_from(added).map_err(|_| ValidationError::InvalidAmount {
            field: "packs",
            value: packs.to_string(),
        })?;
        self.commit(
            vec![Write::AdjustStock {
                medicine_id: medicine.id.clone(),
                delta,
            }]
            .into(),
        )?;
        tracing::info!(medicine_id = %medicine.id, packs, units = added, "Restocked medicine");
        self.require_medicine(id)
    }

    /// Remove a medicine from inventory. Saved records keep their line-item
    /// snapshots.
    pub fn delete_medicine(&mut self, id: &str) -> LedgerResult<Medicine> {
        let medicine = self.require_medicine(id)?;
        self.commit(vec![Write::DeleteMedicine(medicine.id.clone())].into())?;
        tracing::info!(medicine_id = %medicine.id, units = medicine.total_units, "Deleted medicine");
        Ok(medicine)
    }

    pub fn get_medicine(&self, id: &str) -> LedgerResult<Option<Medicine>> {
        Ok(self.store.get_medicine(id)?)
    }

    pub fn list_medicines(&self) -> LedgerResult<Vec<Medicine>> {
        Ok(self.store.list_medicines()?)
    }

    pub fn search_medicines(&self, query: &str, limit: usize) -> LedgerResult<Vec<Medicine>> {
        Ok(self.store.search_medicines(query, limit)?)
    }

    /// Medicines that are out of stock or below the low-stock threshold.
    pub fn low_stock_medicines(&self) -> LedgerResult<Vec<Medicine>> {
        let threshold = self.config.low_stock_threshold;
        Ok(self
            .store
            .list_medicines()?
            .into_iter()
            .filter(|m| m.stock_status(threshold) != StockStatus::InStock)
            .collect())
    }

    /// Snapshot a line item from the current medicine.
    pub fn line_item(&self, medicine_id: &str, quantity: u32, discount: f64) -> LedgerResult<LineItem> {
        let medicine = self.require_medicine(medicine_id)?;
        Ok(LineItem::from_medicine(&medicine, quantity, discount)?)
    }

    /// Bulk-add medicines from a JSON seed list. Nothing is added unless
    /// every entry is valid.
    pub fn import_seeds(&mut self, json: &str) -> LedgerResult<Vec<Medicine>> {
        let medicines = parse_seeds(json)?;
        let mut batch = WriteBatch::new();
        for medicine in &medicines {
            batch.push(Write::PutMedicine(medicine.clone()));
        }
        self.commit(batch)?;
        tracing::info!(count = medicines.len(), "Imported medicines");
        Ok(medicines)
    }

    /// Erase everything stored and replace the inventory with the given
    /// seed list (which may be empty).
    pub fn clear_all(&mut self, seeds_json: &str) -> LedgerResult<Vec<Medicine>> {
        let medicines = if seeds_json.trim().is_empty() {
            Vec::new()
        } else {
            parse_seeds(seeds_json)?
        };
        let mut batch = WriteBatch::new();
        batch.push(Write::Clear);
        for medicine in &medicines {
            batch.push(Write::PutMedicine(medicine.clone()));
        }
        self.commit(batch)?;
        tracing::warn!(medicines = medicines.len(), "Cleared all ledger data");
        Ok(medicines)
    }

    pub(super) fn require_medicine(&self, id: &str) -> LedgerResult<Medicine> {
        self.store
            .get_medicine(id)?
            .ok_or_else(|| LedgerError::MedicineNotFound(id.to_string()))
    }
}

fn parse_seeds(json: &str) -> LedgerResult<Vec<Medicine>> {
    let seeds: Vec<MedicineSeed> = serde_json::from_str(json)
        .map_err(|e| ValidationError::InvalidImport(e.to_string()))?;
    seeds
        .into_iter()
        .map(|seed| -> LedgerResult<Medicine> { Ok(NewMedicine::try_from(seed)?.validate()?) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DosageForm;
    use crate::store::MemoryStore;

    fn panadol(packs: u32) -> NewMedicine {
        NewMedicine {
            details: MedicineDetails {
                name: "Panadol".into(),
                strength: "500mg".into(),
                form: DosageForm::Tablet,
                pack_purchase_rate: 400.0,
                pack_retail_rate: 475.0,
                units_per_pack: 10,
            },
            packs,
        }
    }

    const SEEDS: &str = r#"[
        {"name":"Augmentin","strength":"625mg","type":"Tablet","packPurchaseRate":300,"packRetailRate":380,"unitsPerPack":6,"initialPacks":2},
        {"name":"Brufen","strength":"120ml","type":"Syrup","packPurchaseRate":90,"packRetailRate":120,"unitsPerPack":1}
    ]"#;

    #[test]
    fn test_add_and_restock() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let med = ledger.add_medicine(panadol(3)).unwrap();
        assert_eq!(med.total_units, 30);

        let med = ledger.restock(&med.id, 2).unwrap();
        assert_eq!(med.total_units, 50);
        assert_eq!(ledger.get_medicine(&med.id).unwrap().unwrap().total_units, 50);

        assert!(matches!(ledger.restock(&med.id, 0), Err(LedgerError::Validation(_))));
        assert!(matches!(ledger.restock("nope", 1), Err(LedgerError::MedicineNotFound(_))));
    }

    #[test]
    fn test_update_keeps_stock() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let med = ledger.add_medicine(panadol(3)).unwrap();
        let mut details = panadol(0).details;
        details.pack_retail_rate = 500.0;
        let updated = ledger.update_medicine(&med.id, details).unwrap();
        assert_eq!(updated.total_units, 30);
        assert!((updated.retail_per_unit() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_delete_medicine() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let med = ledger.add_medicine(panadol(1)).unwrap();
        ledger.delete_medicine(&med.id).unwrap();
        assert!(ledger.get_medicine(&med.id).unwrap().is_none());
        assert!(matches!(
            ledger.delete_medicine(&med.id),
            Err(LedgerError::MedicineNotFound(_))
        ));
    }

    #[test]
    fn test_low_stock() {
        let mut ledger = Ledger::new(MemoryStore::new());
        ledger.add_medicine(panadol(5)).unwrap();
        let empty = ledger.add_medicine(panadol(0)).unwrap();
        let low = ledger.low_stock_medicines().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, empty.id);
    }

    #[test]
    fn test_import_seeds() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let imported = ledger.import_seeds(SEEDS).unwrap();
        assert_eq!(imported.len(), 2);
        let meds = ledger.list_medicines().unwrap();
        assert_eq!(meds[0].name, "Augmentin");
        assert_eq!(meds[0].total_units, 12);
        assert_eq!(meds[1].form, DosageForm::Syrup);
        assert_eq!(meds[1].total_units, 0);
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let bad = r#"[
            {"name":"Augmentin","strength":"625mg","type":"Tablet","packPurchaseRate":300,"packRetailRate":380,"unitsPerPack":6},
            {"name":"Mystery","strength":"1g","type":"Powder","packPurchaseRate":1,"packRetailRate":2,"unitsPerPack":1}
        ]"#;
        assert!(ledger.import_seeds(bad).is_err());
        assert!(ledger.list_medicines().unwrap().is_empty());
        assert!(matches!(
            ledger.import_seeds("not json"),
            Err(LedgerError::Validation(ValidationError::InvalidImport(_)))
        ));
    }

    #[test]
    fn test_clear_all_reseeds() {
        let mut ledger = Ledger::new(MemoryStore::new());
        ledger.add_medicine(panadol(3)).unwrap();
        ledger
            .add_entry(crate::models::EntryKind::Expense, "Rent", "100")
            .unwrap();

        let seeded = ledger.clear_all(SEEDS).unwrap();
        assert_eq!(seeded.len(), 2);
        assert_eq!(ledger.list_medicines().unwrap().len(), 2);
        assert!(ledger.list_entries().unwrap().is_empty());

        ledger.clear_all("").unwrap();
        assert!(ledger.list_medicines().unwrap().is_empty());
    }

    #[test]
    fn test_line_item_uses_current_rates() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let med = ledger.add_medicine(panadol(3)).unwrap();
        let line = ledger.line_item(&med.id, 2, 10.0).unwrap();
        assert!((line.final_price - 42.75).abs() < 1e-9);
        assert!(matches!(
            ledger.line_item("nope", 1, 0.0),
            Err(LedgerError::MedicineNotFound(_))
        ));
    }
}
