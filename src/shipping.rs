use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical shipping method. Two external vocabularies map into it:
/// the customer form ("일반" / "제주/도서" / "픽업") and the admin
/// manual-entry form ("택배" / in-person / other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    Standard,
    Island,
    Pickup,
    Courier,
    InPerson,
    Other,
}

/// Fee bracket used by the settlement engine. Selection happens here,
/// amounts come from the session's shipping config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTier {
    Free,
    Normal,
    Remote,
}

impl ShippingMethod {
    /// Accepts both external vocabularies plus the canonical names.
    /// Unknown values become `Other` so settlement never fails on
    /// vocabulary drift; `Other` is fee-tiered as normal shipping.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "standard" | "일반" => Self::Standard,
            "island" | "제주/도서" | "제주-도서" => Self::Island,
            "pickup" | "픽업" => Self::Pickup,
            "courier" | "택배" => Self::Courier,
            "in_person" | "in-person" | "대면" => Self::InPerson,
            _ => Self::Other,
        }
    }

    pub fn fee_tier(self) -> FeeTier {
        match self {
            // Nothing leaves the seller's hands by carrier.
            Self::Pickup | Self::InPerson => FeeTier::Free,
            Self::Island => FeeTier::Remote,
            Self::Standard | Self::Courier | Self::Other => FeeTier::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Island => "island",
            Self::Pickup => "pickup",
            Self::Courier => "courier",
            Self::InPerson => "in_person",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_vocabulary_maps_to_canonical_methods() {
        assert_eq!(ShippingMethod::parse("일반"), ShippingMethod::Standard);
        assert_eq!(ShippingMethod::parse("제주/도서"), ShippingMethod::Island);
        assert_eq!(ShippingMethod::parse("픽업"), ShippingMethod::Pickup);
    }

    #[test]
    fn manual_entry_vocabulary_maps_to_canonical_methods() {
        assert_eq!(ShippingMethod::parse("택배"), ShippingMethod::Courier);
        assert_eq!(ShippingMethod::parse("in-person"), ShippingMethod::InPerson);
    }

    #[test]
    fn unknown_values_fall_back_to_other_with_normal_tier() {
        let method = ShippingMethod::parse("drone-drop");
        assert_eq!(method, ShippingMethod::Other);
        assert_eq!(method.fee_tier(), FeeTier::Normal);
    }

    #[test]
    fn fee_tiers() {
        assert_eq!(ShippingMethod::Standard.fee_tier(), FeeTier::Normal);
        assert_eq!(ShippingMethod::Courier.fee_tier(), FeeTier::Normal);
        assert_eq!(ShippingMethod::Island.fee_tier(), FeeTier::Remote);
        assert_eq!(ShippingMethod::Pickup.fee_tier(), FeeTier::Free);
        assert_eq!(ShippingMethod::InPerson.fee_tier(), FeeTier::Free);
    }

    #[test]
    fn round_trips_through_storage_form() {
        for method in [
            ShippingMethod::Standard,
            ShippingMethod::Island,
            ShippingMethod::Pickup,
            ShippingMethod::Courier,
            ShippingMethod::InPerson,
            ShippingMethod::Other,
        ] {
            assert_eq!(ShippingMethod::parse(method.as_str()), method);
        }
    }
}
