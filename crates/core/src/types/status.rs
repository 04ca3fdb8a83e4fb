//! Status and classification enums.
//!
//! All of these are stored as `TEXT` columns and travel over JSON in
//! `snake_case`. The string forms are defined once by `text_enum!` so that
//! `as_str`, `Display`, `FromStr` and serde always agree.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Defines a fieldless enum with a fixed `snake_case` string form.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $kind:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $text:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored and serialized string form.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Lifecycle of a customer order.
    #[derive(Default)]
    pub enum OrderStatus as "order status" {
        /// Placed by the customer, not yet reviewed.
        #[default]
        Pending => "pending",
        /// Confirmed by staff (usually by phone).
        Confirmed => "confirmed",
        /// Being packed.
        Processing => "processing",
        /// Handed to the courier.
        Shipped => "shipped",
        /// Received by the customer.
        Delivered => "delivered",
        /// Cancelled before delivery.
        Cancelled => "cancelled",
        /// Sent back after delivery.
        Returned => "returned",
    }
}

impl OrderStatus {
    /// Whether an order in this status may be moved to `next`.
    ///
    /// Cancelled and returned orders are final, and a delivered order can
    /// only be returned. Any other move is allowed, including moving
    /// backwards, since staff correct mistakes by hand.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::Cancelled | Self::Returned => false,
            Self::Delivered => next == Self::Returned,
            Self::Pending | Self::Confirmed | Self::Processing | Self::Shipped => true,
        }
    }

    /// Whether the order still needs work (not delivered, cancelled or returned).
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled | Self::Returned)
    }
}

text_enum! {
    /// How the customer pays.
    #[derive(Default)]
    pub enum PaymentMethod as "payment method" {
        /// Cash collected by the courier.
        #[default]
        CashOnDelivery => "cash_on_delivery",
        /// bKash mobile wallet.
        Bkash => "bkash",
        /// Nagad mobile wallet.
        Nagad => "nagad",
    }
}

impl PaymentMethod {
    /// Human label for receipts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on delivery",
            Self::Bkash => "bKash",
            Self::Nagad => "Nagad",
        }
    }
}

text_enum! {
    /// Shipping zone, which decides the shipping charge.
    pub enum DeliveryArea as "delivery area" {
        InsideDhaka => "inside_dhaka",
        OutsideDhaka => "outside_dhaka",
    }
}

text_enum! {
    /// Admin role with different permission levels.
    pub enum AdminRole as "admin role" {
        /// Full access including admin accounts and courier credentials.
        SuperAdmin => "super_admin",
        /// Full access to store management features.
        Admin => "admin",
    }
}

impl AdminRole {
    /// Whether this role may manage other admins and courier credentials.
    #[must_use]
    pub const fn is_super_admin(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

text_enum! {
    /// Supported courier services.
    pub enum CourierProvider as "courier provider" {
        Steadfast => "steadfast",
    }
}

text_enum! {
    /// Delivery status as reported by Steadfast.
    pub enum CourierDeliveryStatus as "courier delivery status" {
        Pending => "pending",
        DeliveredApprovalPending => "delivered_approval_pending",
        PartialDeliveredApprovalPending => "partial_delivered_approval_pending",
        CancelledApprovalPending => "cancelled_approval_pending",
        UnknownApprovalPending => "unknown_approval_pending",
        Delivered => "delivered",
        PartialDelivered => "partial_delivered",
        Cancelled => "cancelled",
        Hold => "hold",
        InReview => "in_review",
        Unknown => "unknown",
    }
}

impl CourierDeliveryStatus {
    /// Parse a courier-reported status, treating anything unrecognized as
    /// [`Self::Unknown`].
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.trim().to_ascii_lowercase().parse().unwrap_or(Self::Unknown)
    }

    /// The order status this courier status implies, if any.
    ///
    /// Statuses still awaiting Steadfast's approval leave the order alone.
    #[must_use]
    pub const fn order_status(self) -> Option<OrderStatus> {
        match self {
            Self::Delivered | Self::PartialDelivered => Some(OrderStatus::Delivered),
            Self::Cancelled => Some(OrderStatus::Cancelled),
            Self::Pending | Self::InReview | Self::Hold => Some(OrderStatus::Shipped),
            Self::DeliveredApprovalPending
            | Self::PartialDeliveredApprovalPending
            | Self::CancelledApprovalPending
            | Self::UnknownApprovalPending
            | Self::Unknown => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_string_forms_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        for status in CourierDeliveryStatus::ALL {
            assert_eq!(
                status.to_string().parse::<CourierDeliveryStatus>().unwrap(),
                *status
            );
        }
    }

    #[test]
    fn test_serde_matches_as_str() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cash_on_delivery\""
        );
        assert_eq!(
            serde_json::to_string(&CourierDeliveryStatus::PartialDeliveredApprovalPending).unwrap(),
            "\"partial_delivered_approval_pending\""
        );
        let role: AdminRole = serde_json::from_str("\"super_admin\"").unwrap();
        assert!(role.is_super_admin());
    }

    #[test]
    fn test_parse_error() {
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: lost");
    }

    #[test]
    fn test_terminal_statuses() {
        for next in OrderStatus::ALL {
            let same = *next == OrderStatus::Cancelled;
            assert_eq!(OrderStatus::Cancelled.can_transition_to(*next), same);
        }
        assert!(!OrderStatus::Returned.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Returned));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
    }

    #[test]
    fn test_open_statuses_move_freely() {
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Processing.is_open());
        assert!(!OrderStatus::Delivered.is_open());
    }

    #[test]
    fn test_courier_status_mapping() {
        use CourierDeliveryStatus as C;

        assert_eq!(C::Delivered.order_status(), Some(OrderStatus::Delivered));
        assert_eq!(C::PartialDelivered.order_status(), Some(OrderStatus::Delivered));
        assert_eq!(C::Cancelled.order_status(), Some(OrderStatus::Cancelled));
        assert_eq!(C::InReview.order_status(), Some(OrderStatus::Shipped));
        assert_eq!(C::Hold.order_status(), Some(OrderStatus::Shipped));
        assert_eq!(C::DeliveredApprovalPending.order_status(), None);
        assert_eq!(C::Unknown.order_status(), None);
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(
            CourierDeliveryStatus::parse_lenient(" Delivered "),
            CourierDeliveryStatus::Delivered
        );
        assert_eq!(
            CourierDeliveryStatus::parse_lenient("lost_in_transit"),
            CourierDeliveryStatus::Unknown
        );
    }
}
