//! Maps `Box<dyn Error>` from trait boundaries to typed `GaugeError`.
//!
//! The traits in `gauge_traits` use `Box<dyn Error + Send + Sync>` so any bus
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `gauge_hardware::HwError` downcasting.

use gauge_traits::Register;

use crate::error::GaugeError;

/// Map a failed read of `register` to a typed `GaugeError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_transport_error(
    register: Register,
    e: &(dyn std::error::Error + 'static),
) -> GaugeError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<gauge_hardware::error::HwError>() {
            return match hw {
                gauge_hardware::error::HwError::Timeout => GaugeError::TransportTimeout { register },
                other => GaugeError::Transport {
                    register,
                    message: other.to_string(),
                },
            };
        }
    }

    let message = e.to_string();
    if message.to_lowercase().contains("timeout") || message.to_lowercase().contains("timed out")
    {
        GaugeError::TransportTimeout { register }
    } else {
        GaugeError::Transport { register, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_timeout_maps_to_timeout_variant() {
        let e: Box<dyn std::error::Error + Send + Sync> = "bus timeout".into();
        assert_eq!(
            map_transport_error(Register::Soc, e.as_ref()),
            GaugeError::TransportTimeout {
                register: Register::Soc
            }
        );
    }

    #[test]
    fn other_errors_keep_their_message() {
        let e: Box<dyn std::error::Error + Send + Sync> = "nack".into();
        let mapped = map_transport_error(Register::Crate, e.as_ref());
        assert_eq!(
            mapped,
            GaugeError::Transport {
                register: Register::Crate,
                message: "nack".to_string()
            }
        );
        assert!(mapped.is_transport());
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_timeout_is_downcast() {
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(gauge_hardware::error::HwError::Timeout);
        assert_eq!(
            map_transport_error(Register::Vcell, e.as_ref()),
            GaugeError::TransportTimeout {
                register: Register::Vcell
            }
        );
    }
}
