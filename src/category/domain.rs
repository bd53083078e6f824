//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId};

/// Database identifier for a category.
pub type CategoryId = DatabaseId;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether money in a category is earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryKind {
    /// Money coming in, e.g. salary.
    Income,
    /// Money going out, e.g. groceries.
    #[default]
    Expense,
}

impl CategoryKind {
    /// The value stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

/// How important the spending in a category is, from A (very important) to D (other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    /// Very important.
    A,
    /// Important.
    B,
    /// Not essential.
    #[default]
    C,
    /// Everything else.
    D,
}

impl Classification {
    /// The value stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// The 50/30/20 budget bucket a category's spending counts towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetBucket {
    /// Needs, targeted at 50% of income.
    Essentials,
    /// Wants, targeted at 30% of income.
    Lifestyle,
    /// Savings and investments, targeted at 20% of income.
    Savings,
    /// Not part of the budget rule, e.g. income categories.
    #[default]
    NotApplicable,
}

impl BudgetBucket {
    /// The budgeted buckets in the order they are reported.
    pub const BUDGETED: [BudgetBucket; 3] = [Self::Essentials, Self::Lifestyle, Self::Savings];

    /// The value stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Essentials => "essentials",
            Self::Lifestyle => "lifestyle",
            Self::Savings => "savings",
            Self::NotApplicable => "not-applicable",
        }
    }

    /// The target share of income in percent, if the bucket is budgeted.
    pub fn target_percent(self) -> Option<u32> {
        match self {
            Self::Essentials => Some(50),
            Self::Lifestyle => Some(30),
            Self::Savings => Some(20),
            Self::NotApplicable => None,
        }
    }
}

/// A category for grouping ledger entries (e.g., 'Groceries', 'Salary').
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name.
    pub name: CategoryName,
    /// Whether entries in the category are income or expenses.
    pub kind: CategoryKind,
    /// The priority of the spending.
    pub classification: Classification,
    /// The 50/30/20 bucket.
    pub bucket: BudgetBucket,
    /// Archived categories keep their history but cannot be used for new entries.
    pub is_active: bool,
}

/// The fields needed to create or edit a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// The display name.
    pub name: CategoryName,
    /// Income or expense.
    pub kind: CategoryKind,
    /// The priority of the spending.
    pub classification: Classification,
    /// The 50/30/20 bucket.
    pub bucket: BudgetBucket,
}

impl NewCategory {
    /// An active expense category with classification C outside the budget buckets.
    pub fn new(name: CategoryName) -> Self {
        Self {
            name,
            kind: CategoryKind::default(),
            classification: Classification::default(),
            bucket: BudgetBucket::default(),
        }
    }

    /// Set the kind.
    pub fn kind(mut self, kind: CategoryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the classification.
    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    /// Set the budget bucket.
    pub fn bucket(mut self, bucket: BudgetBucket) -> Self {
        self.bucket = bucket;
        self
    }
}

fn unknown_value(column: &str, value: &str) -> FromSqlError {
    FromSqlError::Other(format!("unknown {column} \"{value}\"").into())
}

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(unknown_value("category kind", other)),
        }
    }
}

impl ToSql for Classification {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Classification {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(unknown_value("classification", other)),
        }
    }
}

impl ToSql for BudgetBucket {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for BudgetBucket {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "essentials" => Ok(Self::Essentials),
            "lifestyle" => Ok(Self::Lifestyle),
            "savings" => Ok(Self::Savings),
            "not-applicable" => Ok(Self::NotApplicable),
            other => Err(unknown_value("budget bucket", other)),
        }
    }
}
