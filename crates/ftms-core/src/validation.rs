//! Local form validation
//!
//! Drafts are checked before anything is sent to the backend. Every rule
//! runs so all offending fields are reported together.

use serde::{Deserialize, Serialize};

use crate::models::{JournalEntryDraft, LoanRequestDraft, RevenueDraft};
use crate::time::parse_datetime;

/// Largest amount accepted by any form
pub const MAX_AMOUNT: f64 = 1e12;

/// Maximum length of free-text fields (remarks, purpose, description)
pub const MAX_TEXT_LEN: usize = 500;

/// Maximum length of short identifier fields
pub const MAX_NAME_LEN: usize = 100;

/// A validation failure attached to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors of one submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message reported for `field`
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Types that can be checked before submission
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Accumulates field errors across rules
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Non-blank text
    pub fn required(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, format!("{} is required", label));
        }
        self
    }

    pub fn max_len(&mut self, field: &str, label: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.push(field, format!("{} must be at most {} characters", label, max));
        }
        self
    }

    /// Required positive amount, at most [`MAX_AMOUNT`]
    pub fn amount(&mut self, field: &str, label: &str, value: Option<f64>) -> &mut Self {
        match value {
            None => {
                self.push(field, format!("{} is required", label));
            }
            Some(v) if !v.is_finite() => {
                self.push(field, format!("{} must be a number", label));
            }
            Some(v) if v <= 0.0 => {
                self.push(field, format!("{} must be greater than zero", label));
            }
            Some(v) if v > MAX_AMOUNT => {
                self.push(field, format!("{} must not exceed {}", label, MAX_AMOUNT));
            }
            Some(_) => {}
        }
        self
    }

    /// Required date in a recognised format
    pub fn date(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        self.required(field, label, value);
        if !self.has_error(field) && parse_datetime(value).is_none() {
            self.push(field, format!("{} must be a date (YYYY-MM-DD)", label));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }
}

impl Validate for RevenueDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("department", "Department", &self.department)
            .max_len("department", "Department", &self.department, MAX_NAME_LEN)
            .required("category", "Category", &self.category)
            .amount("amount", "Amount", self.amount)
            .date("date", "Date", &self.date)
            .max_len("remarks", "Remarks", &self.remarks, MAX_TEXT_LEN)
            .finish()
    }
}

impl Validate for LoanRequestDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("employeeName", "Employee name", &self.employee_name)
            .max_len("employeeName", "Employee name", &self.employee_name, MAX_NAME_LEN)
            .required("department", "Department", &self.department)
            .required("loanType", "Loan type", &self.loan_type)
            .required("purpose", "Purpose", &self.purpose)
            .max_len("purpose", "Purpose", &self.purpose, MAX_TEXT_LEN)
            .amount("amount", "Amount", self.amount)
            .date("requestDate", "Request date", &self.request_date)
            .finish()
    }
}

impl Validate for JournalEntryDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("reference", "Reference", &self.reference)
            .max_len("reference", "Reference", &self.reference, MAX_NAME_LEN)
            .required("account", "Account", &self.account)
            .date("date", "Date", &self.date)
            .max_len("description", "Description", &self.description, MAX_TEXT_LEN);

        let debit = self.debit.unwrap_or(0.0);
        let credit = self.credit.unwrap_or(0.0);
        match (debit > 0.0, credit > 0.0) {
            (true, false) => {
                v.amount("debit", "Debit", self.debit);
            }
            (false, true) => {
                v.amount("credit", "Credit", self.credit);
            }
            (true, true) => {
                v.push("credit", "Enter either a debit or a credit, not both");
            }
            (false, false) => {
                v.push("debit", "Enter a positive debit or credit amount");
            }
        }
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revenue() -> RevenueDraft {
        RevenueDraft {
            reference_id: "OR-1001".to_string(),
            department: "Operations".to_string(),
            category: "Fare".to_string(),
            amount: Some(1500.0),
            date: "2024-03-01".to_string(),
            remarks: String::new(),
        }
    }

    #[test]
    fn test_valid_revenue() {
        assert!(revenue().validate().is_ok());
    }

    #[test]
    fn test_reports_every_field() {
        let draft = RevenueDraft {
            department: " ".to_string(),
            amount: None,
            date: "03/01/2024".to_string(),
            ..revenue()
        };
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.errors.len(), 3);
        assert_eq!(errors.message_for("department"), Some("Department is required"));
        assert_eq!(errors.message_for("amount"), Some("Amount is required"));
        assert!(errors.message_for("date").unwrap().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_amount_bounds() {
        let mut v = Validator::new();
        v.amount("a", "A", Some(0.0))
            .amount("b", "B", Some(-5.0))
            .amount("c", "C", Some(f64::NAN))
            .amount("d", "D", Some(2e12))
            .amount("e", "E", Some(MAX_AMOUNT));
        let errors = v.finish().unwrap_err();
        let fields: Vec<&str> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_length_limit() {
        let draft = LoanRequestDraft {
            employee_name: "Juan Dela Cruz".to_string(),
            department: "Maintenance".to_string(),
            loan_type: "Emergency".to_string(),
            purpose: "x".repeat(MAX_TEXT_LEN + 1),
            amount: Some(5000.0),
            request_date: "2024-02-10".to_string(),
        };
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].field, "purpose");
    }

    #[test]
    fn test_journal_debit_xor_credit() {
        let base = JournalEntryDraft {
            reference: "JE-001".to_string(),
            date: "2024-01-05".to_string(),
            account: "Cash".to_string(),
            description: "Fare collection".to_string(),
            debit: Some(100.0),
            credit: None,
            status: None,
        };
        assert!(base.validate().is_ok());

        let both = JournalEntryDraft {
            credit: Some(100.0),
            ..base.clone()
        };
        assert!(both.validate().is_err());

        let neither = JournalEntryDraft {
            debit: Some(0.0),
            ..base.clone()
        };
        assert_eq!(
            neither.validate().unwrap_err().message_for("debit"),
            Some("Enter a positive debit or credit amount")
        );
    }

    #[test]
    fn test_display_joins_fields() {
        let errors = ValidationErrors {
            errors: vec![FieldError::new("amount", "Amount is required"), FieldError::new("date", "Date is required")],
        };
        assert_eq!(errors.to_string(), "amount: Amount is required; date: Date is required");
    }
}
