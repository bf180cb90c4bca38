//! # Ledger
//!
//! The single-user bookkeeping state: every entry list plus the settings,
//! with the mutations that keep them consistent.
//!
//! ## Consistency Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  add_trip ──────► TripEntry + its station/commute legs                  │
//! │  update_trip ───► recompute, old legs replaced by fresh ones            │
//! │  delete_trip ───► trip + legs linked by id                              │
//! │                   (no linked legs: unlinked legs on start/end date)     │
//! │                                                                         │
//! │  upsert_monthly_expense ──► one record per (year, month), overwrite     │
//! │  quick_add_monthly_expense ► one record per (year, month), reject dup   │
//! │                                                                         │
//! │  delete_* on an unknown id ──► no-op                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger does no I/O. Loading and saving it, and deleting receipt files
//! of removed entries, is up to the caller.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregate::{month_name, EntrySet, MonthlyBreakdown};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::export::export_csv;
use crate::meal::TripInput;
use crate::mileage::{generate_trip_legs, legs_for_trip, replaceable_legs_for_trip, MileageInput};
use crate::money::Money;
use crate::rates::TaxRates;
use crate::rollup::{recent_activities, Activity, YearlyRollup};
use crate::types::{
    CommuteSettings, EmployerRefundSettings, EquipmentEntry, ExpenseEntry, MileageEntry, MonthlyEmployerExpense,
    Settings, TripEntry,
};
use crate::validation::{
    validate_amount, validate_distance, validate_month, validate_name, validate_note, MAX_NAME_LENGTH,
};
use crate::RECEIPTS_DIR;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn id_or_new(id: &str) -> String {
    if id.trim().is_empty() {
        new_id()
    } else {
        id.to_string()
    }
}

/// Logical storage key of a receipt file.
///
/// ```rust
/// use pendler_core::ledger::receipt_path;
///
/// assert_eq!(receipt_path("beleg_42.jpg"), "receipts/beleg_42.jpg");
/// ```
pub fn receipt_path(file_name: &str) -> String {
    format!("{}/{}", RECEIPTS_DIR, file_name)
}

// =============================================================================
// Backup
// =============================================================================

/// A full or partial snapshot of the ledger.
///
/// Absent sections are left untouched by [`Ledger::import`]. The trip list
/// also reads from the older `mealEntries` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default, alias = "mealEntries", skip_serializing_if = "Option::is_none")]
    pub trip_entries: Option<Vec<TripEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_entries: Option<Vec<MileageEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_entries: Option<Vec<EquipmentEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_entries: Option<Vec<ExpenseEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_employer_expenses: Option<Vec<MonthlyEmployerExpense>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_commute: Option<CommuteSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rates: Option<TaxRates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer_refund_settings: Option<EmployerRefundSettings>,
}

// =============================================================================
// Ledger
// =============================================================================

/// Application state: entry lists and settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ledger {
    pub trips: Vec<TripEntry>,
    pub mileage: Vec<MileageEntry>,
    pub equipment: Vec<EquipmentEntry>,
    pub expenses: Vec<ExpenseEntry>,
    pub monthly_expenses: Vec<MonthlyEmployerExpense>,
    pub settings: Settings,
}

impl Ledger {
    pub fn new(settings: Settings) -> Self {
        Ledger {
            settings,
            ..Ledger::default()
        }
    }

    /// Borrowed view of all entry lists for the calculators.
    pub fn entries(&self) -> EntrySet<'_> {
        EntrySet {
            trips: &self.trips,
            mileage: &self.mileage,
            equipment: &self.equipment,
            expenses: &self.expenses,
            monthly_expenses: &self.monthly_expenses,
        }
    }

    pub fn tax_rates(&self) -> &TaxRates {
        &self.settings.tax_rates
    }

    // -------------------------------------------------------------------------
    // Trips
    // -------------------------------------------------------------------------

    /// Records a trip and the legs it implies.
    ///
    /// An id is generated when `id` is `None`.
    pub fn add_trip(&mut self, id: Option<String>, input: &TripInput) -> CoreResult<TripEntry> {
        let id = id.map(|i| id_or_new(&i)).unwrap_or_else(new_id);
        let trip = TripEntry::from_input(id, input, &self.settings.tax_rates)?;
        let legs = generate_trip_legs(&trip, &self.settings);

        info!(
            trip_id = %trip.id,
            deductible = trip.deductible.cents(),
            legs = legs.len(),
            "Trip added"
        );

        self.mileage.extend(legs);
        self.trips.push(trip.clone());
        Ok(trip)
    }

    /// Replaces a trip's inputs, recomputes it and regenerates its legs.
    ///
    /// ## Errors
    /// - `EntryNotFound` if no trip has this id
    /// - `Validation` if the input is rejected (the ledger is left unchanged)
    pub fn update_trip(&mut self, id: &str, input: &TripInput) -> CoreResult<TripEntry> {
        let index = self
            .trips
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::EntryNotFound {
                entity: "Trip".to_string(),
                id: id.to_string(),
            })?;

        let updated = TripEntry::from_input(id, input, &self.settings.tax_rates)?;
        self.remove_replaceable_legs(index);

        let legs = generate_trip_legs(&updated, &self.settings);
        info!(trip_id = %id, legs = legs.len(), "Trip updated");

        self.mileage.extend(legs);
        self.trips[index] = updated.clone();
        Ok(updated)
    }

    /// Deletes a trip together with its legs.
    ///
    /// Returns the removed trip and legs; an unknown id removes nothing.
    pub fn delete_trip(&mut self, id: &str) -> Option<(TripEntry, Vec<MileageEntry>)> {
        let index = self.trips.iter().position(|t| t.id == id)?;
        let legs = self.remove_trip_legs(index);
        let trip = self.trips.remove(index);

        info!(trip_id = %id, legs = legs.len(), "Trip deleted");
        Some((trip, legs))
    }

    fn remove_trip_legs(&mut self, trip_index: usize) -> Vec<MileageEntry> {
        let ids: Vec<String> = legs_for_trip(&self.trips[trip_index], &self.mileage)
            .into_iter()
            .map(|m| m.id.clone())
            .collect();
        self.remove_mileage_ids(&ids)
    }

    fn remove_replaceable_legs(&mut self, trip_index: usize) -> Vec<MileageEntry> {
        let ids: Vec<String> = replaceable_legs_for_trip(&self.trips[trip_index], &self.mileage)
            .into_iter()
            .map(|m| m.id.clone())
            .collect();
        self.remove_mileage_ids(&ids)
    }

    fn remove_mileage_ids(&mut self, ids: &[String]) -> Vec<MileageEntry> {
        let (removed, kept): (Vec<MileageEntry>, Vec<MileageEntry>) =
            std::mem::take(&mut self.mileage).into_iter().partition(|m| ids.contains(&m.id));
        self.mileage = kept;
        removed
    }

    /// Recomputes every trip against the current tax rates.
    pub fn recompute_trips(&mut self) {
        let rates = self.settings.tax_rates;
        for trip in &mut self.trips {
            trip.recompute(&rates);
        }
        debug!(trips = self.trips.len(), "Trips recomputed");
    }

    // -------------------------------------------------------------------------
    // Mileage
    // -------------------------------------------------------------------------

    pub fn add_mileage(&mut self, input: &MileageInput) -> CoreResult<MileageEntry> {
        let entry = MileageEntry::new(new_id(), input, &self.settings.tax_rates)?;
        info!(mileage_id = %entry.id, allowance = entry.allowance.cents(), "Mileage added");
        self.mileage.push(entry.clone());
        Ok(entry)
    }

    pub fn delete_mileage(&mut self, id: &str) -> Option<MileageEntry> {
        let index = self.mileage.iter().position(|m| m.id == id)?;
        info!(mileage_id = %id, "Mileage deleted");
        Some(self.mileage.remove(index))
    }

    // -------------------------------------------------------------------------
    // Equipment
    // -------------------------------------------------------------------------

    /// Adds an equipment purchase. An empty id is replaced by a generated one.
    pub fn add_equipment(&mut self, entry: EquipmentEntry) -> CoreResult<EquipmentEntry> {
        validate_name("name", &entry.name)?;
        validate_amount("price", entry.price)?;

        let entry = EquipmentEntry {
            id: id_or_new(&entry.id),
            ..entry
        };
        info!(equipment_id = %entry.id, price = entry.price.cents(), "Equipment added");
        self.equipment.push(entry.clone());
        Ok(entry)
    }

    pub fn update_equipment(&mut self, entry: EquipmentEntry) -> CoreResult<EquipmentEntry> {
        validate_name("name", &entry.name)?;
        validate_amount("price", entry.price)?;

        let slot = self
            .equipment
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| CoreError::EntryNotFound {
                entity: "Equipment".to_string(),
                id: entry.id.clone(),
            })?;

        *slot = entry.clone();
        info!(equipment_id = %entry.id, "Equipment updated");
        Ok(entry)
    }

    pub fn delete_equipment(&mut self, id: &str) -> Option<EquipmentEntry> {
        let index = self.equipment.iter().position(|e| e.id == id)?;
        info!(equipment_id = %id, "Equipment deleted");
        Some(self.equipment.remove(index))
    }

    // -------------------------------------------------------------------------
    // Personal Expenses
    // -------------------------------------------------------------------------

    pub fn add_expense(&mut self, entry: ExpenseEntry) -> CoreResult<ExpenseEntry> {
        validate_amount("amount", entry.amount)?;
        if entry.description.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: "description".to_string(),
                max: MAX_NAME_LENGTH,
            }
            .into());
        }

        let entry = ExpenseEntry {
            id: id_or_new(&entry.id),
            ..entry
        };
        info!(expense_id = %entry.id, amount = entry.amount.cents(), "Expense added");
        self.expenses.push(entry.clone());
        Ok(entry)
    }

    pub fn delete_expense(&mut self, id: &str) -> Option<ExpenseEntry> {
        let index = self.expenses.iter().position(|e| e.id == id)?;
        info!(expense_id = %id, "Expense deleted");
        Some(self.expenses.remove(index))
    }

    // -------------------------------------------------------------------------
    // Monthly Employer Expenses
    // -------------------------------------------------------------------------

    fn validate_monthly(month: u32, amount: Money, note: Option<&str>) -> CoreResult<Option<String>> {
        validate_month(month)?;
        validate_amount("amount", amount)?;
        Ok(validate_note(note)?)
    }

    /// Stores the reimbursement for `(year, month)`, overwriting an existing
    /// record for the same month.
    pub fn upsert_monthly_expense(
        &mut self,
        year: i32,
        month: u32,
        amount: Money,
        note: Option<&str>,
    ) -> CoreResult<MonthlyEmployerExpense> {
        let note = Self::validate_monthly(month, amount, note)?;

        if let Some(existing) = self
            .monthly_expenses
            .iter_mut()
            .find(|e| e.year == year && e.month == month)
        {
            existing.amount = amount;
            existing.note = note;
            info!(year, month, amount = amount.cents(), "Monthly expense overwritten");
            return Ok(existing.clone());
        }

        let record = MonthlyEmployerExpense {
            id: new_id(),
            year,
            month,
            amount,
            note,
        };
        info!(year, month, amount = amount.cents(), "Monthly expense added");
        self.monthly_expenses.push(record.clone());
        Ok(record)
    }

    /// Adds the reimbursement for a month that has none yet.
    ///
    /// ## Errors
    /// - `Duplicate` if the month is already recorded
    /// - `Negative` / `TooLong` / `OutOfRange` for invalid input
    pub fn quick_add_monthly_expense(
        &mut self,
        year: i32,
        month: u32,
        amount: Money,
        note: Option<&str>,
    ) -> CoreResult<MonthlyEmployerExpense> {
        Self::validate_monthly(month, amount, note)?;

        if self.monthly_expenses.iter().any(|e| e.year == year && e.month == month) {
            return Err(ValidationError::Duplicate {
                field: "month".to_string(),
                value: format!("{} {}", month_name(month), year),
            }
            .into());
        }

        self.upsert_monthly_expense(year, month, amount, note)
    }

    pub fn delete_monthly_expense(&mut self, id: &str) -> Option<MonthlyEmployerExpense> {
        let index = self.monthly_expenses.iter().position(|e| e.id == id)?;
        info!(expense_id = %id, "Monthly expense deleted");
        Some(self.monthly_expenses.remove(index))
    }

    /// First month of `year` (0-indexed) without a reimbursement record.
    pub fn next_free_month(&self, year: i32) -> Option<u32> {
        (0..12).find(|month| {
            !self
                .monthly_expenses
                .iter()
                .any(|e| e.year == year && e.month == *month)
        })
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    /// Replaces the tax rates and recomputes all stored trips.
    pub fn set_tax_rates(&mut self, rates: TaxRates) -> CoreResult<()> {
        rates.validate()?;
        self.settings.tax_rates = rates;
        self.recompute_trips();
        Ok(())
    }

    pub fn set_station_distance(&mut self, km: f64) -> CoreResult<()> {
        validate_distance(km)?;
        self.settings.station_distance = km;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Backup
    // -------------------------------------------------------------------------

    /// Replaces the sections present in `backup`, leaving the others as they
    /// are, then recomputes every trip against the resulting rates.
    pub fn import(&mut self, backup: Backup) -> CoreResult<()> {
        if let Some(rates) = &backup.tax_rates {
            rates.validate()?;
        }
        if let Some(km) = backup.station_distance {
            validate_distance(km)?;
        }

        let mut sections = Vec::new();

        if let Some(trips) = backup.trip_entries {
            self.trips = trips;
            sections.push("trips");
        }
        if let Some(mileage) = backup.mileage_entries {
            self.mileage = mileage;
            sections.push("mileage");
        }
        if let Some(equipment) = backup.equipment_entries {
            self.equipment = equipment;
            sections.push("equipment");
        }
        if let Some(expenses) = backup.expense_entries {
            self.expenses = expenses;
            sections.push("expenses");
        }
        if let Some(monthly) = backup.monthly_employer_expenses {
            self.monthly_expenses = monthly;
            sections.push("monthlyEmployerExpenses");
        }
        if let Some(commute) = backup.default_commute {
            self.settings.default_commute = commute;
            sections.push("defaultCommute");
        }
        if let Some(rates) = backup.tax_rates {
            self.settings.tax_rates = rates;
            sections.push("taxRates");
        }
        if let Some(km) = backup.station_distance {
            self.settings.station_distance = km;
            sections.push("stationDistance");
        }
        if let Some(refund) = backup.employer_refund_settings {
            self.settings.employer_refund = Some(refund);
            sections.push("employerRefundSettings");
        }

        // Stored derived values may predate the rates now in effect
        self.recompute_trips();

        info!(sections = ?sections, "Backup imported");
        Ok(())
    }

    /// Full snapshot with every section present.
    pub fn backup(&self) -> Backup {
        Backup {
            trip_entries: Some(self.trips.clone()),
            mileage_entries: Some(self.mileage.clone()),
            equipment_entries: Some(self.equipment.clone()),
            expense_entries: Some(self.expenses.clone()),
            monthly_employer_expenses: Some(self.monthly_expenses.clone()),
            default_commute: Some(self.settings.default_commute),
            tax_rates: Some(self.settings.tax_rates),
            station_distance: Some(self.settings.station_distance),
            employer_refund_settings: self.settings.employer_refund,
        }
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    pub fn breakdown(&self, year: i32) -> MonthlyBreakdown {
        MonthlyBreakdown::compute(year, self.entries(), self.settings.tax_rates.gwg_limit)
    }

    pub fn rollup(&self, year: i32) -> YearlyRollup {
        YearlyRollup::from_breakdown(&self.breakdown(year), &self.expenses)
    }

    pub fn recent_activities(&self, limit: usize) -> Vec<Activity> {
        recent_activities(self.entries(), self.settings.tax_rates.gwg_limit, limit)
    }

    /// CSV text of `year`, see [`crate::export`].
    pub fn export_csv(&self, year: i32) -> CoreResult<String> {
        let gwg_limit = self.settings.tax_rates.gwg_limit;
        let (_, rollup) = YearlyRollup::compute(year, self.entries(), gwg_limit);
        export_csv(year, &rollup, self.entries(), gwg_limit)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
