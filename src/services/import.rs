//! CSV Import service
//!
//! Reads transactions from CSV with the header
//! `date,type,amount,category,description[,payee]`. Columns are located by
//! header name, so their order does not matter and extra columns are ignored.
//! Import is two-step: build a preview (parse, resolve categories, detect
//! duplicates), then execute it.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use crate::audit::{AuditEntry, EntityType};
use crate::error::{FintrackError, FintrackResult};
use crate::models::category::{FALLBACK_EXPENSE_CATEGORY, FALLBACK_INCOME_CATEGORY};
use crate::models::{Category, CategoryId, Money, Transaction, TransactionKind, UserId};
use crate::storage::Storage;

use super::category::CategoryService;

/// Date formats tried in order
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d.%m.%Y", "%Y/%m/%d", "%m-%d-%Y",
];

/// Where each known column sits in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMapping {
    date: usize,
    amount: usize,
    kind: Option<usize>,
    category: Option<usize>,
    description: Option<usize>,
    payee: Option<usize>,
}

impl ColumnMapping {
    fn from_headers(headers: &StringRecord) -> FintrackResult<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };

        let date = find(&["date", "posted", "transaction date"])
            .ok_or_else(|| FintrackError::Import("CSV has no 'date' column".into()))?;
        let amount = find(&["amount", "value"])
            .ok_or_else(|| FintrackError::Import("CSV has no 'amount' column".into()))?;

        Ok(Self {
            date,
            amount,
            kind: find(&["type", "kind"]),
            category: find(&["category"]),
            description: find(&["description", "memo", "note"]),
            payee: find(&["payee", "merchant"]),
        })
    }
}

/// One successfully parsed CSV row
#[derive(Debug, Clone, Serialize)]
pub struct ParsedRow {
    /// 1-based data row (the header is row 0)
    pub row: usize,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    /// Always positive
    pub amount: Money,
    pub category: String,
    pub description: String,
    pub payee: String,
    pub import_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ImportStatus {
    New,
    /// Already imported, or repeated earlier in the same file
    Duplicate,
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportPreviewEntry {
    pub row: usize,
    pub parsed: Option<ParsedRow>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    /// The named category was unknown and a fallback was used
    pub fell_back: bool,
    pub status: ImportStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportPreview {
    pub entries: Vec<ImportPreviewEntry>,
}

impl ImportPreview {
    fn count(&self, pred: impl Fn(&ImportStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }

    pub fn new_count(&self) -> usize {
        self.count(|s| *s == ImportStatus::New)
    }

    pub fn duplicate_count(&self) -> usize {
        self.count(|s| *s == ImportStatus::Duplicate)
    }

    pub fn error_count(&self) -> usize {
        self.count(|s| matches!(s, ImportStatus::Error(_)))
    }
}

/// Result of a completed import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub imported: usize,
    pub duplicates: usize,
    pub errors: usize,
    /// Error message per data row
    pub error_messages: Vec<(usize, String)>,
}

/// Service for CSV import
pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Parse CSV from a reader; row errors are returned in place
    pub fn parse_csv<R: Read>(&self, input: R) -> FintrackResult<Vec<Result<ParsedRow, String>>> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| FintrackError::Import(format!("Cannot read CSV header: {}", e)))?
            .clone();
        let mapping = ColumnMapping::from_headers(&headers)?;

        Ok(reader
            .records()
            .enumerate()
            .map(|(idx, record)| {
                let row = idx + 1;
                record
                    .map_err(|e| format!("Error reading CSV record: {}", e))
                    .and_then(|r| parse_record(&r, row, &mapping))
            })
            .collect())
    }

    /// Parse and check a CSV without changing anything
    pub fn preview<R: Read>(&self, user_id: UserId, input: R) -> FintrackResult<ImportPreview> {
        let parsed = self.parse_csv(input)?;
        let categories = CategoryService::new(self.storage).list_visible(user_id)?;
        let fallback_expense = find_category(
            &categories,
            FALLBACK_EXPENSE_CATEGORY,
            TransactionKind::Expense,
        );
        let fallback_income =
            find_category(&categories, FALLBACK_INCOME_CATEGORY, TransactionKind::Income);

        let mut seen: HashSet<String> = HashSet::new();
        let mut entries = Vec::with_capacity(parsed.len());

        for (idx, result) in parsed.into_iter().enumerate() {
            let row = match result {
                Ok(row) => row,
                Err(message) => {
                    entries.push(ImportPreviewEntry {
                        row: idx + 1,
                        parsed: None,
                        category_id: None,
                        category_name: None,
                        fell_back: false,
                        status: ImportStatus::Error(message),
                    });
                    continue;
                }
            };

            let named = if row.category.is_empty() {
                None
            } else {
                find_category(&categories, &row.category, row.kind)
            };
            let fallback = match row.kind {
                TransactionKind::Expense => fallback_expense,
                TransactionKind::Income => fallback_income,
            };
            let fell_back = named.is_none();
            let category = named.or(fallback);

            let status = if category.is_none() {
                ImportStatus::Error(format!(
                    "No category '{}' and no fallback category available",
                    row.category
                ))
            } else if !seen.insert(row.import_id.clone())
                || self
                    .storage
                    .transactions
                    .find_by_import_id(user_id, &row.import_id)?
                    .is_some()
            {
                ImportStatus::Duplicate
            } else {
                ImportStatus::New
            };

            entries.push(ImportPreviewEntry {
                row: row.row,
                category_id: category.map(|c| c.id),
                category_name: category.map(|c| c.name.clone()),
                fell_back: fell_back && !row.category.is_empty(),
                parsed: Some(row),
                status,
            });
        }

        Ok(ImportPreview { entries })
    }

    /// Import every `New` entry of a preview
    pub fn execute(&self, user_id: UserId, preview: &ImportPreview) -> FintrackResult<ImportResult> {
        let mut result = ImportResult::default();
        let mut audit = Vec::new();

        for entry in &preview.entries {
            match (&entry.status, &entry.parsed, entry.category_id) {
                (ImportStatus::New, Some(row), Some(category_id)) => {
                    // The preview may be stale; re-check before writing
                    if self
                        .storage
                        .transactions
                        .find_by_import_id(user_id, &row.import_id)?
                        .is_some()
                    {
                        result.duplicates += 1;
                        continue;
                    }

                    let mut txn =
                        Transaction::new(user_id, row.kind, row.amount, category_id, row.date);
                    txn.description = row.description.clone();
                    txn.payee = row.payee.clone();
                    txn.import_id = Some(row.import_id.clone());

                    if let Err(e) = txn.validate() {
                        result.errors += 1;
                        result.error_messages.push((entry.row, e.to_string()));
                        continue;
                    }

                    audit.push(
                        AuditEntry::create(
                            EntityType::Transaction,
                            txn.id.to_string(),
                            Some(txn.description.clone()).filter(|d| !d.is_empty()),
                            &txn,
                        )
                        .by(Some(user_id)),
                    );
                    self.storage.transactions.upsert(txn)?;
                    result.imported += 1;
                }
                (ImportStatus::Duplicate, _, _) => result.duplicates += 1,
                (ImportStatus::Error(message), _, _) => {
                    result.errors += 1;
                    result.error_messages.push((entry.row, message.clone()));
                }
                _ => {
                    result.errors += 1;
                    result
                        .error_messages
                        .push((entry.row, "Incomplete preview entry".to_string()));
                }
            }
        }

        if result.imported > 0 {
            self.storage.transactions.save()?;
            self.storage.audit().log_batch(&audit)?;
        }
        tracing::info!(
            user = %user_id,
            imported = result.imported,
            duplicates = result.duplicates,
            errors = result.errors,
            "csv import finished"
        );

        Ok(result)
    }

    /// Preview and execute a CSV file in one go
    pub fn import_file(&self, user_id: UserId, path: &Path) -> FintrackResult<ImportResult> {
        let file = std::fs::File::open(path).map_err(|e| {
            FintrackError::Import(format!("Cannot open {}: {}", path.display(), e))
        })?;
        let preview = self.preview(user_id, file)?;
        self.execute(user_id, &preview)
    }
}

/// Active category of the given kind with a matching name
fn find_category<'c>(
    categories: &'c [Category],
    name: &str,
    kind: TransactionKind,
) -> Option<&'c Category> {
    categories
        .iter()
        .find(|c| !c.archived && c.kind == kind && c.name_matches(name))
}

fn parse_record(
    record: &StringRecord,
    row: usize,
    mapping: &ColumnMapping,
) -> Result<ParsedRow, String> {
    let field = |col: Option<usize>| {
        col.and_then(|c| record.get(c))
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };

    let date = parse_date(&field(Some(mapping.date)))?;
    let signed = parse_amount(&field(Some(mapping.amount)))?;
    if signed.is_zero() {
        return Err("Amount cannot be zero".to_string());
    }

    // An explicit type wins; otherwise the sign decides
    let kind_text = field(mapping.kind);
    let kind = if kind_text.is_empty() {
        if signed.is_negative() {
            TransactionKind::Expense
        } else {
            TransactionKind::Income
        }
    } else {
        kind_text.parse::<TransactionKind>()?
    };

    let description = field(mapping.description);
    let mut candidate = Transaction::new(
        UserId::default(),
        kind,
        signed.abs(),
        CategoryId::default(),
        date,
    );
    candidate.description = description.clone();

    Ok(ParsedRow {
        row,
        date,
        kind,
        amount: signed.abs(),
        category: field(mapping.category),
        description,
        payee: field(mapping.payee),
        import_id: candidate.generate_import_id(),
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .ok_or_else(|| format!("Could not parse date: '{}'", s))
}

/// Amounts may carry currency symbols, thousands separators or accounting
/// parentheses for negatives
fn parse_amount(s: &str) -> Result<Money, String> {
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    Money::parse(body)
        .map(|m| if negative { -m.abs() } else { m })
        .map_err(|e| format!("Could not parse amount '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{create_test_storage, register};

    const CSV: &str = "\
date,type,amount,category,description,payee
2025-03-01,income,\"$4,000.00\",Salary,March pay,Employer
2025-03-02,expense,52.10,groceries,Weekly shop,Market
2025-03-03,expense,18.00,Pet Food,Kibble,
03/04/2025,,-9.99,Entertainment,Streaming,
2025-03-05,expense,abc,Groceries,Broken,
2025-03-02,expense,52.10,Groceries,Weekly shop,Market
";

    #[test]
    fn test_parse_csv() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let rows = service.parse_csv(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 6);

        let salary = rows[0].as_ref().unwrap();
        assert_eq!(salary.kind, TransactionKind::Income);
        assert_eq!(salary.amount.cents(), 400_000);
        assert_eq!(salary.payee, "Employer");

        // sign decides when the type is blank
        let streaming = rows[3].as_ref().unwrap();
        assert_eq!(streaming.kind, TransactionKind::Expense);
        assert_eq!(streaming.amount.cents(), 999);
        assert_eq!(streaming.date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());

        assert!(rows[4].is_err());
    }

    #[test]
    fn test_missing_required_column() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let result = service.parse_csv("when,amount\n2025-01-01,1.00\n".as_bytes());
        assert!(matches!(result, Err(FintrackError::Import(_))));
    }

    #[test]
    fn test_preview_fallbacks_and_duplicates() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let alice = register(&storage, "alice");

        let preview = service.preview(alice.id, CSV.as_bytes()).unwrap();
        assert_eq!(preview.new_count(), 4);
        assert_eq!(preview.duplicate_count(), 1);
        assert_eq!(preview.error_count(), 1);

        let pet_food = &preview.entries[2];
        assert!(pet_food.fell_back);
        assert_eq!(pet_food.category_name.as_deref(), Some(FALLBACK_EXPENSE_CATEGORY));

        let groceries = &preview.entries[1];
        assert!(!groceries.fell_back);
        assert_eq!(groceries.category_name.as_deref(), Some("Groceries"));
    }

    #[test]
    fn test_execute_is_idempotent() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let alice = register(&storage, "alice");

        let preview = service.preview(alice.id, CSV.as_bytes()).unwrap();
        let result = service.execute(alice.id, &preview).unwrap();
        assert_eq!(result.imported, 4);
        assert_eq!(result.duplicates, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(result.error_messages[0].0, 5);
        assert_eq!(storage.transactions.get_by_user(alice.id).unwrap().len(), 4);

        // executing the stale preview again imports nothing
        let again = service.execute(alice.id, &preview).unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.duplicates, 5);

        let fresh = service.preview(alice.id, CSV.as_bytes()).unwrap();
        assert_eq!(fresh.new_count(), 0);
    }
}
