//! Reference data: service packages and fibre distribution points.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::format::format_rupiah;

/// Internet service package.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Package {
    pub package_id: i64,
    pub name: String,
    pub price: Decimal,
    pub rx_limit: Option<String>,
    pub tx_limit: Option<String>,
    pub profile_name: String,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}

impl Package {
    /// `rx/tx` rate limit, e.g. `10M/10M`.
    pub fn speed(&self) -> Option<String> {
        match (&self.rx_limit, &self.tx_limit) {
            (Some(rx), Some(tx)) => Some(format!("{}/{}", rx, tx)),
            (Some(rx), None) => Some(rx.clone()),
            (None, Some(tx)) => Some(tx.clone()),
            (None, None) => None,
        }
    }
}

/// Fibre distribution point (ODP).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DistributionPoint {
    pub distribution_point_id: i64,
    pub name: String,
    pub location: Option<String>,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}

/// Which reference list a dropdown is populated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropdownKind {
    Packages,
    DistributionPoints,
}

impl DropdownKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropdownKind::Packages => "packages",
            DropdownKind::DistributionPoints => "distribution_points",
        }
    }
}

/// One `<option>` in a select box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOption {
    pub id: i64,
    pub name: String,
    pub detail: Option<String>,
}

impl From<&Package> for DropdownOption {
    fn from(package: &Package) -> Self {
        let price = format_rupiah(package.price);
        let detail = match package.speed() {
            Some(speed) => format!("{} - {}", speed, price),
            None => price,
        };
        Self {
            id: package.package_id,
            name: package.name.clone(),
            detail: Some(detail),
        }
    }
}

impl From<&DistributionPoint> for DropdownOption {
    fn from(point: &DistributionPoint) -> Self {
        Self {
            id: point.distribution_point_id,
            name: point.name.clone(),
            detail: point.location.clone().filter(|l| !l.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(rx: Option<&str>, tx: Option<&str>) -> Package {
        Package {
            package_id: 3,
            name: "Home 20".to_string(),
            price: Decimal::from(250_000),
            rx_limit: rx.map(str::to_string),
            tx_limit: tx.map(str::to_string),
            profile_name: "home-20m".to_string(),
            status: "active".to_string(),
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn package_option_shows_speed_and_price() {
        let option = DropdownOption::from(&package(Some("20M"), Some("20M")));
        assert_eq!(option.id, 3);
        assert_eq!(option.detail.as_deref(), Some("20M/20M - Rp 250.000"));

        let option = DropdownOption::from(&package(None, None));
        assert_eq!(option.detail.as_deref(), Some("Rp 250.000"));
    }
}
