//! Alias tables for the categorical fields.
//!
//! Keys are written already canonicalized (trimmed, lowercase, single
//! spaces). Each vocabulary's canonical spellings are matched as well, so
//! they do not need to be repeated here.

use crate::domain::{CanonicalValue, Country, Currency, Department, Gender, State};

/// A vocabulary that knows the raw spellings mapping onto its members
pub trait AliasTable: CanonicalValue {
    fn aliases() -> &'static [(&'static str, Self)];
}

impl AliasTable for Gender {
    fn aliases() -> &'static [(&'static str, Self)] {
        &[("m", Gender::Male), ("f", Gender::Female)]
    }
}

impl AliasTable for Department {
    fn aliases() -> &'static [(&'static str, Self)] {
        &[
            ("hr", Department::HumanResource),
            ("h.r", Department::HumanResource),
            ("h.r.", Department::HumanResource),
            ("human resources", Department::HumanResource),
            ("it", Department::InformationTechnology),
            ("ops", Department::Operations),
            ("eng", Department::Engineering),
            ("fin", Department::Finance),
        ]
    }
}

impl AliasTable for Currency {
    fn aliases() -> &'static [(&'static str, Self)] {
        &[
            ("r", Currency::Zar),
            ("$", Currency::Usd),
            ("£", Currency::Gbp),
            // UTF-8 pound sign read back as Latin-1
            ("â£", Currency::Gbp),
        ]
    }
}

impl AliasTable for Country {
    fn aliases() -> &'static [(&'static str, Self)] {
        &[
            ("south-africa", Country::SouthAfrica),
            ("sa", Country::SouthAfrica),
            ("za", Country::SouthAfrica),
            ("uk", Country::UnitedKingdom),
            ("u.k.", Country::UnitedKingdom),
            ("usa", Country::UnitedStates),
        ]
    }
}

impl AliasTable for State {
    fn aliases() -> &'static [(&'static str, Self)] {
        &[("kzn", State::KwaZuluNatal)]
    }
}
