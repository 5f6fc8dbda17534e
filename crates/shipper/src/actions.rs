//! Per-order shipper actions: call the customer, open navigation.
//!
//! Both actions hand a URL to the platform through the [`Launcher`] port.
//! Navigation prefers the native geo scheme and falls back to a web map
//! URL when the device cannot handle it.

use datmon_core::Order;
use thiserror::Error;
use tracing::debug;

/// Address value some backend builds store before the customer fills in
/// their profile. Navigating to it would be nonsense.
const ADDRESS_PLACEHOLDER: &str = "Chưa cập nhật";

/// Port to the platform's "open this URL in another app" capability.
pub trait Launcher: Send + Sync {
    /// Try to open the URL. Returns whether the platform could handle it.
    fn launch(&self, url: &str) -> bool;
}

/// Failures surfaced to the shipper as alerts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Đơn hàng không có số điện thoại")]
    MissingPhone,
    #[error("Đơn hàng chưa có địa chỉ giao hàng")]
    MissingAddress,
    #[error("Không mở được ứng dụng: {0}")]
    Unlaunchable(String),
}

/// Call the customer on the order's phone number.
///
/// # Errors
///
/// Returns an error if the order carries no phone number or the platform
/// cannot place calls.
pub fn call_customer(order: &Order, launcher: &dyn Launcher) -> Result<(), ActionError> {
    let phone = order.shipping.phone.trim();
    if phone.is_empty() {
        return Err(ActionError::MissingPhone);
    }

    let url = format!("tel:{phone}");
    debug!(order = %order.id, "calling customer");
    if launcher.launch(&url) {
        Ok(())
    } else {
        Err(ActionError::Unlaunchable(url))
    }
}

/// Open navigation to the order's delivery address.
///
/// Tries the native geo scheme first and falls back to a web map URL. The
/// placeholder address some profiles start with counts as missing.
///
/// # Errors
///
/// Returns an error if the address is empty/placeholder or neither URL can
/// be opened.
pub fn navigate_to(order: &Order, launcher: &dyn Launcher) -> Result<(), ActionError> {
    let address = full_address(order);
    if address.is_empty() || address == ADDRESS_PLACEHOLDER {
        return Err(ActionError::MissingAddress);
    }

    let encoded = urlencoding::encode(&address);
    let native = format!("geo:0,0?q={encoded}");
    if launcher.launch(&native) {
        debug!(order = %order.id, "opened native navigation");
        return Ok(());
    }

    let web = format!("https://www.google.com/maps/search/?api=1&query={encoded}");
    debug!(order = %order.id, "falling back to web map");
    if launcher.launch(&web) {
        Ok(())
    } else {
        Err(ActionError::Unlaunchable(web))
    }
}

fn full_address(order: &Order) -> String {
    let line = order.shipping.address_line.trim();
    let city = order.shipping.city.trim();
    if city.is_empty() || line.is_empty() {
        line.to_string()
    } else {
        format!("{line}, {city}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use datmon_core::{OrderId, OrderStatus, PaymentMethod, ShippingSnapshot, Vnd};

    use super::*;

    /// Launcher that records URLs and refuses schemes not in its allowlist.
    struct FakeLauncher {
        handles: &'static [&'static str],
        launched: Mutex<Vec<String>>,
    }

    impl FakeLauncher {
        fn handling(handles: &'static [&'static str]) -> Self {
            Self {
                handles,
                launched: Mutex::new(Vec::new()),
            }
        }

        fn launched(&self) -> Vec<String> {
            self.launched.lock().expect("lock").clone()
        }
    }

    impl Launcher for FakeLauncher {
        fn launch(&self, url: &str) -> bool {
            self.launched.lock().expect("lock").push(url.to_string());
            self.handles.iter().any(|prefix| url.starts_with(prefix))
        }
    }

    fn order(phone: &str, address_line: &str, city: &str) -> Order {
        Order {
            id: OrderId::new(5),
            items: Vec::new(),
            total: Vnd::new(120_000),
            payment_method: PaymentMethod::Cod,
            status: OrderStatus::Delivering,
            created_at: Utc::now(),
            shipping: ShippingSnapshot {
                phone: phone.to_string(),
                address_line: address_line.to_string(),
                city: city.to_string(),
            },
        }
    }

    #[test]
    fn test_call_customer() {
        let launcher = FakeLauncher::handling(&["tel:"]);
        call_customer(&order("0901234567", "", ""), &launcher).expect("call");
        assert_eq!(launcher.launched(), vec!["tel:0901234567".to_string()]);
    }

    #[test]
    fn test_call_without_phone_is_refused() {
        let launcher = FakeLauncher::handling(&["tel:"]);
        let err = call_customer(&order("  ", "", ""), &launcher).expect_err("no phone");
        assert_eq!(err, ActionError::MissingPhone);
        assert!(launcher.launched().is_empty());
    }

    #[test]
    fn test_navigate_prefers_native_scheme() {
        let launcher = FakeLauncher::handling(&["geo:"]);
        navigate_to(&order("", "35 Trần Phú", "Đà Nẵng"), &launcher).expect("navigate");
        let launched = launcher.launched();
        assert_eq!(launched.len(), 1);
        assert!(launched[0].starts_with("geo:0,0?q="));
    }

    #[test]
    fn test_navigate_falls_back_to_web_map() {
        // Device without a maps app: geo: is refused, https: works.
        let launcher = FakeLauncher::handling(&["https:"]);
        navigate_to(&order("", "35 Trần Phú", "Đà Nẵng"), &launcher).expect("navigate");
        let launched = launcher.launched();
        assert_eq!(launched.len(), 2);
        assert!(launched[1].starts_with("https://www.google.com/maps/search/"));
    }

    #[test]
    fn test_navigate_rejects_placeholder_address() {
        let launcher = FakeLauncher::handling(&["geo:", "https:"]);
        let err =
            navigate_to(&order("", "Chưa cập nhật", ""), &launcher).expect_err("placeholder");
        assert_eq!(err, ActionError::MissingAddress);
        assert!(launcher.launched().is_empty());
    }

    #[test]
    fn test_navigate_rejects_empty_address() {
        let launcher = FakeLauncher::handling(&["geo:", "https:"]);
        let err = navigate_to(&order("", "   ", ""), &launcher).expect_err("empty");
        assert_eq!(err, ActionError::MissingAddress);
    }
}
