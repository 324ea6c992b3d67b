//! Domain shapes shared across the pipeline stages.
//!
//! A [`RawEmployeeRow`] is what the loader hands over: every field still as
//! text. An [`EmployeeRecord`] is the typed, cleaned form where `None` is the
//! single missing-value marker.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

/// One data row as read from the input file, all fields untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEmployeeRow {
    /// 1-based line in the source file, for diagnostics
    pub line: u64,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub department: String,
    pub job_title: String,
    pub hire_date: String,
    pub exit_date: String,
    pub is_active: String,
    pub salary: String,
    pub currency: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub manager_id: String,
    pub performance_score: String,
}

/// A cleaned, typed employee record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeRecord {
    pub line: u64,
    pub employee_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Category<Gender>>,
    pub department: Option<Category<Department>>,
    pub job_title: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub salary: Option<f64>,
    pub currency: Option<Category<Currency>>,
    pub country: Option<Category<Country>>,
    pub state: Option<Category<State>>,
    pub city: Option<String>,
    pub manager_id: Option<String>,
    pub performance_score: Option<f64>,
}

/// A closed enumeration with one canonical spelling per member.
pub trait CanonicalValue: Copy + Eq + fmt::Debug + 'static {
    /// Column this vocabulary belongs to
    const FIELD: &'static str;

    /// Every member of the enumeration
    fn all() -> &'static [Self];

    /// The standardized text written to output
    fn canonical(&self) -> &'static str;
}

/// Value of a categorical field after normalization.
///
/// Unrecognized input is carried through unchanged rather than dropped, so
/// that nothing is lost before a human looks at the quality report.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category<T> {
    Canonical(T),
    Unrecognized(String),
}

impl<T: CanonicalValue> Category<T> {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Canonical(value) => value.canonical(),
            Category::Unrecognized(raw) => raw,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, Category::Canonical(_))
    }
}

impl<T: CanonicalValue> fmt::Display for Category<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T: CanonicalValue> Serialize for Category<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl CanonicalValue for Gender {
    const FIELD: &'static str = crate::constants::GENDER;

    fn all() -> &'static [Self] {
        &[Gender::Male, Gender::Female, Gender::Other]
    }

    fn canonical(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Department {
    HumanResource,
    InformationTechnology,
    Operations,
    Engineering,
    Finance,
    Sales,
}

impl CanonicalValue for Department {
    const FIELD: &'static str = crate::constants::DEPARTMENT;

    fn all() -> &'static [Self] {
        &[
            Department::HumanResource,
            Department::InformationTechnology,
            Department::Operations,
            Department::Engineering,
            Department::Finance,
            Department::Sales,
        ]
    }

    fn canonical(&self) -> &'static str {
        match self {
            Department::HumanResource => "Human Resource",
            Department::InformationTechnology => "Information Technology",
            Department::Operations => "Operations",
            Department::Engineering => "Engineering",
            Department::Finance => "Finance",
            Department::Sales => "Sales",
        }
    }
}

/// ISO 4217 currency codes present in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Currency {
    Zar,
    Usd,
    Gbp,
}

impl CanonicalValue for Currency {
    const FIELD: &'static str = crate::constants::CURRENCY;

    fn all() -> &'static [Self] {
        &[Currency::Zar, Currency::Usd, Currency::Gbp]
    }

    fn canonical(&self) -> &'static str {
        match self {
            Currency::Zar => "ZAR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Country {
    SouthAfrica,
    UnitedKingdom,
    UnitedStates,
}

impl CanonicalValue for Country {
    const FIELD: &'static str = crate::constants::COUNTRY;

    fn all() -> &'static [Self] {
        &[Country::SouthAfrica, Country::UnitedKingdom, Country::UnitedStates]
    }

    fn canonical(&self) -> &'static str {
        match self {
            Country::SouthAfrica => "South Africa",
            Country::UnitedKingdom => "United Kingdom",
            Country::UnitedStates => "United States",
        }
    }
}

/// South African provinces seen in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    KwaZuluNatal,
    WesternCape,
    Gauteng,
    Limpopo,
}

impl CanonicalValue for State {
    const FIELD: &'static str = crate::constants::STATE;

    fn all() -> &'static [Self] {
        &[State::KwaZuluNatal, State::WesternCape, State::Gauteng, State::Limpopo]
    }

    fn canonical(&self) -> &'static str {
        match self {
            State::KwaZuluNatal => "KwaZulu-Natal",
            State::WesternCape => "Western Cape",
            State::Gauteng => "Gauteng",
            State::Limpopo => "Limpopo",
        }
    }
}
