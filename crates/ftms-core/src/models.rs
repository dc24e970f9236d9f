//! Domain records of the four list views and their create/update drafts

use serde::{Deserialize, Serialize};

use crate::query::{FieldValue, ListSpec, Record, SortDirection};
use crate::time::parse_datetime;
use crate::types::{EntryStatus, LoanStatus};
use crate::{CoreError, CoreResult};

/// Declares a column enum with its wire name and table heading.
///
/// The wire name is used for JSON keys, query parameters and `FromStr`.
macro_rules! record_fields {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => ($wire:literal, $label:literal)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Column heading
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(format!("Unknown column: {}", s)),
                }
            }
        }
    };
}

// ==================== Revenue ====================

/// Revenue collected by a department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revenue {
    pub id: String,
    /// Official receipt or remittance number
    #[serde(default)]
    pub reference_id: String,
    pub department: String,
    pub category: String,
    /// Signed amount; deductions are negative
    pub amount: f64,
    pub date: String,
    #[serde(default)]
    pub remarks: String,
}

record_fields! {
    /// Columns of the revenue list
    RevenueField {
        ReferenceId => ("referenceId", "Reference"),
        Date => ("date", "Date"),
        Department => ("department", "Department"),
        Category => ("category", "Category"),
        Amount => ("amount", "Amount"),
        Remarks => ("remarks", "Remarks"),
    }
}

impl Record for Revenue {
    type Field = RevenueField;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: RevenueField) -> FieldValue<'_> {
        match field {
            RevenueField::ReferenceId => FieldValue::Text(&self.reference_id),
            RevenueField::Date => FieldValue::Date(parse_datetime(&self.date)),
            RevenueField::Department => FieldValue::Text(&self.department),
            RevenueField::Category => FieldValue::Text(&self.category),
            RevenueField::Amount => FieldValue::Amount(self.amount),
            RevenueField::Remarks => FieldValue::Text(&self.remarks),
        }
    }

    fn columns() -> &'static [RevenueField] {
        RevenueField::ALL
    }
}

impl Revenue {
    pub fn list_spec() -> ListSpec<Revenue> {
        use RevenueField::*;
        ListSpec::new("revenues")
            .searchable(&[Department, Remarks, ReferenceId, Amount])
            .multi_select("category", Category)
            .date_range("date", Date)
            .amount_range("amount", Amount)
            .sortable(&[Date, Amount, Department, Category, ReferenceId])
            .default_sort(Date, SortDirection::Desc)
    }
}

/// Form payload for creating or editing a revenue record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevenueDraft {
    pub reference_id: String,
    pub department: String,
    pub category: String,
    pub amount: Option<f64>,
    pub date: String,
    pub remarks: String,
}

// ==================== Loan requests ====================

/// Employee loan request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub id: String,
    pub employee_name: String,
    pub department: String,
    pub loan_type: String,
    #[serde(default)]
    pub purpose: String,
    pub amount: f64,
    #[serde(default)]
    pub status: LoanStatus,
    pub request_date: String,
}

record_fields! {
    /// Columns of the loan request list
    LoanRequestField {
        RequestId => ("id", "Request ID"),
        EmployeeName => ("employeeName", "Employee"),
        Department => ("department", "Department"),
        LoanType => ("loanType", "Loan Type"),
        Purpose => ("purpose", "Purpose"),
        Amount => ("amount", "Amount"),
        Status => ("status", "Status"),
        RequestDate => ("requestDate", "Requested"),
    }
}

impl Record for LoanRequest {
    type Field = LoanRequestField;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: LoanRequestField) -> FieldValue<'_> {
        match field {
            LoanRequestField::RequestId => FieldValue::Text(&self.id),
            LoanRequestField::EmployeeName => FieldValue::Text(&self.employee_name),
            LoanRequestField::Department => FieldValue::Text(&self.department),
            LoanRequestField::LoanType => FieldValue::Text(&self.loan_type),
            LoanRequestField::Purpose => FieldValue::Text(&self.purpose),
            LoanRequestField::Amount => FieldValue::Amount(self.amount),
            LoanRequestField::Status => FieldValue::Text(self.status.as_str()),
            LoanRequestField::RequestDate => FieldValue::Date(parse_datetime(&self.request_date)),
        }
    }

    fn columns() -> &'static [LoanRequestField] {
        LoanRequestField::ALL
    }
}

impl LoanRequest {
    pub fn list_spec() -> ListSpec<LoanRequest> {
        use LoanRequestField::*;
        ListSpec::new("loan-requests")
            .searchable(&[EmployeeName, RequestId, Purpose])
            .multi_select("status", Status)
            .multi_select("loanType", LoanType)
            .multi_select("department", Department)
            .date_range("requestDate", RequestDate)
            .amount_range("amount", Amount)
            .sortable(&[RequestDate, Amount, EmployeeName, Department, LoanType, Status])
            .default_sort(RequestDate, SortDirection::Desc)
    }

    /// Check that the loan may move to `next`
    pub fn check_transition(&self, next: LoanStatus) -> CoreResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            })
        }
    }
}

/// Form payload for a loan request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoanRequestDraft {
    pub employee_name: String,
    pub department: String,
    pub loan_type: String,
    pub purpose: String,
    pub amount: Option<f64>,
    pub request_date: String,
}

// ==================== Journal entries ====================

/// One journal line; exactly one of debit and credit is non-zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub reference: String,
    pub date: String,
    pub account: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub debit: f64,
    #[serde(default)]
    pub credit: f64,
    #[serde(default)]
    pub status: EntryStatus,
}

impl JournalEntry {
    /// Signed amount: debits positive, credits negative
    pub fn amount(&self) -> f64 {
        self.debit - self.credit
    }

    pub fn list_spec() -> ListSpec<JournalEntry> {
        use JournalEntryField::*;
        ListSpec::new("journal-entries")
            .searchable(&[Reference, Account, Description])
            .multi_select("status", Status)
            .multi_select("account", Account)
            .date_range("date", Date)
            .amount_range("amount", Amount)
            .sortable(&[Date, Reference, Account, Debit, Credit, Amount, Status])
            .default_sort(Date, SortDirection::Asc)
    }
}

record_fields! {
    /// Columns of the journal entry list
    JournalEntryField {
        Reference => ("reference", "Reference"),
        Date => ("date", "Date"),
        Account => ("account", "Account"),
        Description => ("description", "Description"),
        Debit => ("debit", "Debit"),
        Credit => ("credit", "Credit"),
        Amount => ("amount", "Net"),
        Status => ("status", "Status"),
    }
}

impl Record for JournalEntry {
    type Field = JournalEntryField;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: JournalEntryField) -> FieldValue<'_> {
        match field {
            JournalEntryField::Reference => FieldValue::Text(&self.reference),
            JournalEntryField::Date => FieldValue::Date(parse_datetime(&self.date)),
            JournalEntryField::Account => FieldValue::Text(&self.account),
            JournalEntryField::Description => FieldValue::Text(&self.description),
            JournalEntryField::Debit => FieldValue::Number(self.debit),
            JournalEntryField::Credit => FieldValue::Number(self.credit),
            JournalEntryField::Amount => FieldValue::Amount(self.amount()),
            JournalEntryField::Status => FieldValue::Text(self.status.as_str()),
        }
    }

    fn columns() -> &'static [JournalEntryField] {
        JournalEntryField::ALL
    }
}

/// Form payload for a journal line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JournalEntryDraft {
    pub reference: String,
    pub date: String,
    pub account: String,
    pub description: String,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    pub status: Option<EntryStatus>,
}

// ==================== Financial report lines ====================

/// Line item of a financial report (income statement, financial position, cash flow)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub id: String,
    pub report: String,
    pub section: String,
    pub account: String,
    /// Reporting period label, e.g. "2024-Q1"
    pub period: String,
    pub amount: f64,
    #[serde(default)]
    pub notes: String,
}

record_fields! {
    /// Columns of the report line list
    ReportLineField {
        Report => ("report", "Report"),
        Section => ("section", "Section"),
        Account => ("account", "Account"),
        Period => ("period", "Period"),
        Amount => ("amount", "Amount"),
        Notes => ("notes", "Notes"),
    }
}

impl Record for ReportLine {
    type Field = ReportLineField;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: ReportLineField) -> FieldValue<'_> {
        match field {
            ReportLineField::Report => FieldValue::Text(&self.report),
            ReportLineField::Section => FieldValue::Text(&self.section),
            ReportLineField::Account => FieldValue::Text(&self.account),
            ReportLineField::Period => FieldValue::Text(&self.period),
            ReportLineField::Amount => FieldValue::Amount(self.amount),
            ReportLineField::Notes => FieldValue::Text(&self.notes),
        }
    }

    fn columns() -> &'static [ReportLineField] {
        ReportLineField::ALL
    }
}

impl ReportLine {
    pub fn list_spec() -> ListSpec<ReportLine> {
        use ReportLineField::*;
        ListSpec::new("reports/lines")
            .searchable(&[Account, Section, Notes])
            .multi_select("report", Report)
            .multi_select("section", Section)
            .multi_select("period", Period)
            .amount_range("amount", Amount)
            .sortable(&[Report, Section, Account, Period, Amount])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterValue, Sort};

    fn revenues() -> Vec<Revenue> {
        serde_json::from_value(serde_json::json!([
            {"id": "r1", "referenceId": "OR-1", "department": "Operations", "category": "Fare",
             "amount": 100.0, "date": "2024-01-10", "remarks": ""},
            {"id": "r2", "referenceId": "OR-2", "department": "Operations", "category": "Deduction",
             "amount": -50.0, "date": "2024-01-11", "remarks": "Driver shortage"},
            {"id": "r3", "referenceId": "OR-3", "department": "Rentals", "category": "Rental",
             "amount": 75.0, "date": "2024-01-12"}
        ]))
        .unwrap()
    }

    fn ids<R: Record>(items: &[&R]) -> Vec<String> {
        items.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_revenue_amount_filter_and_sort() {
        let rows = revenues();
        let spec = Revenue::list_spec();
        let mut query = spec.new_query();
        query.set_filter(&spec, "amount", FilterValue::amount_range(Some(60.0), None)).unwrap();
        query.set_sort(&spec, Some(Sort::desc(RevenueField::Amount))).unwrap();
        query.set_page_size(1).unwrap();
        query.set_page(2);
        let outcome = spec.run(&rows, &query);
        assert_eq!(ids(&outcome.all), vec!["r1", "r3"]);
        assert_eq!(ids(&outcome.items), vec!["r3"]);
    }

    #[test]
    fn test_revenue_search_remarks() {
        let rows = revenues();
        let spec = Revenue::list_spec();
        let mut query = spec.new_query();
        query.set_search("driver");
        assert_eq!(ids(&spec.filter(&rows, &query)), vec!["r2"]);
    }

    #[test]
    fn test_revenue_default_sort_newest_first() {
        let rows = revenues();
        let spec = Revenue::list_spec();
        let outcome = spec.run(&rows, &spec.new_query());
        assert_eq!(ids(&outcome.all), vec!["r3", "r2", "r1"]);
    }

    #[test]
    fn test_field_names_roundtrip() {
        for field in LoanRequestField::ALL {
            assert_eq!(field.as_str().parse::<LoanRequestField>().unwrap(), *field);
        }
        assert!("employee".parse::<LoanRequestField>().is_err());
        assert_eq!(serde_json::to_value(JournalEntryField::Debit).unwrap(), "debit");
    }

    #[test]
    fn test_journal_signed_amount() {
        let entry: JournalEntry = serde_json::from_value(serde_json::json!({
            "id": "j1", "reference": "JE-1", "date": "2024-01-01", "account": "Cash", "credit": 250.0
        }))
        .unwrap();
        assert_eq!(entry.amount(), -250.0);
        assert_eq!(entry.status, EntryStatus::Draft);
        assert_eq!(entry.value(JournalEntryField::Amount).magnitude(), Some(250.0));
    }

    #[test]
    fn test_loan_status_filter_and_transition() {
        let loans: Vec<LoanRequest> = serde_json::from_value(serde_json::json!([
            {"id": "L-1", "employeeName": "Ana", "department": "Ops", "loanType": "Salary",
             "amount": 1000.0, "status": "pending", "requestDate": "2024-02-01"},
            {"id": "L-2", "employeeName": "Ben", "department": "Ops", "loanType": "Emergency",
             "amount": 2000.0, "status": "approved", "requestDate": "2024-02-02"}
        ]))
        .unwrap();
        let spec = LoanRequest::list_spec();
        let mut query = spec.new_query();
        query.set_filter(&spec, "status", FilterValue::multi_select(["approved"])).unwrap();
        assert_eq!(ids(&spec.filter(&loans, &query)), vec!["L-2"]);

        assert!(loans[0].check_transition(LoanStatus::Approved).is_ok());
        assert!(matches!(
            loans[1].check_transition(LoanStatus::Rejected),
            Err(CoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_draft_missing_fields_default() {
        let draft: RevenueDraft = serde_json::from_str(r#"{"department": "Ops"}"#).unwrap();
        assert_eq!(draft.amount, None);
        assert!(draft.category.is_empty());
    }
}
