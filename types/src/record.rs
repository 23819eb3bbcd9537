//! Student records and their editable details.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Canonical, RollNo, Snapshot, Timestamp, VerificationStatus};

/// Fields whose modification demotes verification status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtectedField {
    Name,
    Email,
    MobileNumber,
    FatherMobileNumber,
    DateOfBirth,
    Address,
    FieldOfStudy,
    Taluka,
    City,
    District,
    Pincode,
}

impl ProtectedField {
    /// Every protected field, in snapshot order.
    pub const ALL: [ProtectedField; 11] = [
        Self::Name,
        Self::Email,
        Self::MobileNumber,
        Self::FatherMobileNumber,
        Self::DateOfBirth,
        Self::Address,
        Self::FieldOfStudy,
        Self::Taluka,
        Self::City,
        Self::District,
        Self::Pincode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::MobileNumber => "mobile_number",
            Self::FatherMobileNumber => "father_mobile_number",
            Self::DateOfBirth => "date_of_birth",
            Self::Address => "address",
            Self::FieldOfStudy => "field_of_study",
            Self::Taluka => "taluka",
            Self::City => "city",
            Self::District => "district",
            Self::Pincode => "pincode",
        }
    }
}

impl fmt::Display for ProtectedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The editable portion of a student record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDetails {
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub father_mobile_number: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub field_of_study: String,
    #[serde(default)]
    pub taluka: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
}

impl StudentDetails {
    /// Canonical value of a single protected field.
    pub fn field(&self, field: ProtectedField) -> String {
        match field {
            ProtectedField::Name => self.name.canonical(),
            ProtectedField::Email => self.email.canonical(),
            ProtectedField::MobileNumber => self.mobile_number.canonical(),
            ProtectedField::FatherMobileNumber => self.father_mobile_number.canonical(),
            ProtectedField::DateOfBirth => self.date_of_birth.canonical(),
            ProtectedField::Address => self.address.canonical(),
            ProtectedField::FieldOfStudy => self.field_of_study.canonical(),
            ProtectedField::Taluka => self.taluka.canonical(),
            ProtectedField::City => self.city.canonical(),
            ProtectedField::District => self.district.canonical(),
            ProtectedField::Pincode => self.pincode.canonical(),
        }
    }

    /// Snapshot of every protected field in [`ProtectedField::ALL`] order.
    pub fn snapshot(&self) -> Snapshot {
        ProtectedField::ALL
            .iter()
            .map(|f| (f.as_str(), self.field(*f)))
            .collect()
    }
}

/// A partial edit: `None` leaves the stored value untouched.
///
/// For the optional locality fields an empty string clears the value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailsPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub father_mobile_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub field_of_study: Option<String>,
    pub taluka: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
}

impl DetailsPatch {
    /// Merge this patch onto `base`, producing the complete new details.
    pub fn apply_to(&self, base: &StudentDetails) -> StudentDetails {
        fn locality(patch: &Option<String>, current: &Option<String>) -> Option<String> {
            match patch {
                Some(v) if v.is_empty() => None,
                Some(v) => Some(v.clone()),
                None => current.clone(),
            }
        }

        StudentDetails {
            name: self.name.clone().unwrap_or_else(|| base.name.clone()),
            email: self.email.clone().unwrap_or_else(|| base.email.clone()),
            mobile_number: self
                .mobile_number
                .clone()
                .unwrap_or_else(|| base.mobile_number.clone()),
            father_mobile_number: self
                .father_mobile_number
                .clone()
                .unwrap_or_else(|| base.father_mobile_number.clone()),
            date_of_birth: self.date_of_birth.unwrap_or(base.date_of_birth),
            address: self.address.clone().unwrap_or_else(|| base.address.clone()),
            field_of_study: self
                .field_of_study
                .clone()
                .unwrap_or_else(|| base.field_of_study.clone()),
            taluka: locality(&self.taluka, &base.taluka),
            city: locality(&self.city, &base.city),
            district: locality(&self.district, &base.district),
            pincode: locality(&self.pincode, &base.pincode),
        }
    }
}

/// A student record as held by the record store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub roll_no: RollNo,
    pub details: StudentDetails,
    pub is_mobile_verified: bool,
    pub is_data_verified: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StudentRecord {
    /// A freshly registered, unverified record.
    pub fn new(roll_no: RollNo, details: StudentDetails, now: Timestamp) -> Self {
        Self {
            roll_no,
            details,
            is_mobile_verified: false,
            is_data_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> VerificationStatus {
        VerificationStatus::from_flags(self.is_mobile_verified, self.is_data_verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> StudentDetails {
        StudentDetails {
            name: "Asha Ravi Patil".into(),
            email: "asha@example.com".into(),
            mobile_number: "9000000000".into(),
            father_mobile_number: "9000000001".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2005, 1, 9).unwrap(),
            address: "12 Mill Road, Pune".into(),
            field_of_study: "Computer Science".into(),
            taluka: Some("Haveli".into()),
            city: None,
            district: Some("Pune".into()),
            pincode: Some("411001".into()),
        }
    }

    #[test]
    fn snapshot_covers_every_protected_field_in_order() {
        let snap = details().snapshot();
        let names: Vec<&str> = snap.iter().map(|(n, _)| n).collect();
        let expected: Vec<&str> = ProtectedField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(names, expected);
        assert_eq!(snap.get("date_of_birth"), Some("2005-01-09"));
        assert_eq!(snap.get("city"), Some(""));
    }

    #[test]
    fn empty_patch_is_identity() {
        let base = details();
        assert_eq!(DetailsPatch::default().apply_to(&base), base);
    }

    #[test]
    fn patch_overrides_and_clears_locality() {
        let base = details();
        let patch = DetailsPatch {
            address: Some("4 Station Road, Pune".into()),
            taluka: Some(String::new()),
            city: Some("Pune".into()),
            ..Default::default()
        };
        let merged = patch.apply_to(&base);
        assert_eq!(merged.address, "4 Station Road, Pune");
        assert_eq!(merged.taluka, None);
        assert_eq!(merged.city.as_deref(), Some("Pune"));
        assert_eq!(merged.mobile_number, base.mobile_number);
    }

    #[test]
    fn new_record_starts_unverified() {
        let rec = StudentRecord::new(RollNo::new("101").unwrap(), details(), Timestamp::new(5));
        assert_eq!(rec.status(), VerificationStatus::Unverified);
        assert_eq!(rec.created_at, rec.updated_at);
    }
}
