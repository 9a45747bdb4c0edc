//! Insurance bill operations. Bills never move stock.

use super::{Ledger, LedgerError, LedgerResult};
use crate::models::{InsuranceBill, NewInsuranceBill};
use crate::store::{LedgerStore, Write};

impl<S: LedgerStore> Ledger<S> {
    /// Validate and save a new insurance bill.
    pub fn save_bill(&mut self, new: NewInsuranceBill) -> LedgerResult<InsuranceBill> {
        let bill = new.validate()?;
        self.commit(vec![Write::PutBill(bill.clone())].into())?;
        tracing::info!(
            bill_id = %bill.id,
            insurance_number = %bill.insurance_number,
            total = bill.total_amount,
            "Saved insurance bill"
        );
        Ok(bill)
    }

    pub fn delete_bill(&mut self, id: &str) -> LedgerResult<InsuranceBill> {
        let bill = self
            .store
            .get_bill(id)?
            .ok_or_else(|| LedgerError::BillNotFound(id.to_string()))?;
        self.commit(vec![Write::DeleteBill(bill.id.clone())].into())?;
        tracing::info!(bill_id = %bill.id, "Deleted insurance bill");
        Ok(bill)
    }

    pub fn get_bill(&self, id: &str) -> LedgerResult<Option<InsuranceBill>> {
        Ok(self.store.get_bill(id)?)
    }

    /// Bills newest first, optionally narrowed to a patient name, CNIC or
    /// insurance number containing `query` (case-insensitive).
    pub fn list_bills(&self, query: &str) -> LedgerResult<Vec<InsuranceBill>> {
        let query = query.trim().to_lowercase();
        let bills = self.store.list_bills()?;
        if query.is_empty() {
            return Ok(bills);
        }
        Ok(bills
            .into_iter()
            .filter(|b| {
                [&b.patient_name, &b.patient_cnic, &b.insurance_number]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&query))
            })
            .collect())
    }
}
