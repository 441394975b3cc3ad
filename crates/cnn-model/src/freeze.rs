//! Política de congelado de capas del backbone.
//!
//! - `FreezeAll`: ninguna capa del backbone queda entrenable (default).
//! - `FreezeAllBut(k)`: sólo las últimas `k` capas quedan entrenables.
//!   `k` debe ser > 0; si `k` ≥ número de capas, todas quedan entrenables.
//!
//! No congelar nada no es una política expuesta.

use cnn_core::FlowError;
use log::warn;

use crate::layer::Layer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreezePolicy {
    #[default]
    FreezeAll,
    FreezeAllBut(usize),
}

impl FreezePolicy {
    /// Construye `FreezeAllBut(k)` rechazando `k <= 0`.
    pub fn freeze_all_but(k: i64) -> Result<Self, FlowError> {
        if k <= 0 {
            return Err(FlowError::InvalidFreezePolicy(format!("freeze_till must be a positive integer, got {k}")));
        }
        Ok(FreezePolicy::FreezeAllBut(k as usize))
    }

    /// Traduce el par de flags de config (`FREEZE_ALL`, `FREEZE_TILL`).
    pub fn from_flags(freeze_all: bool, freeze_till: Option<i64>) -> Result<Self, FlowError> {
        if freeze_all {
            return Ok(FreezePolicy::FreezeAll);
        }
        match freeze_till {
            Some(k) => Self::freeze_all_but(k),
            None => Err(FlowError::InvalidFreezePolicy("FREEZE_ALL is false but FREEZE_TILL is not set".into())),
        }
    }

    /// Aplica la política fijando `trainable` en cada capa.
    pub fn apply(&self, layers: &mut [Layer]) {
        let keep_trainable = match *self {
            FreezePolicy::FreezeAll => 0,
            FreezePolicy::FreezeAllBut(k) => {
                if k >= layers.len() {
                    warn!("freeze_till={k} covers all {} backbone layers; nothing is frozen", layers.len());
                }
                k.min(layers.len())
            }
        };
        let boundary = layers.len() - keep_trainable;
        for (i, layer) in layers.iter_mut().enumerate() {
            layer.trainable = i >= boundary;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerKind;

    fn layers(n: usize) -> Vec<Layer> {
        (0..n).map(|i| Layer::new(format!("l{i}"), LayerKind::Flatten, vec![1], 1))
              .collect()
    }

    fn flags(ls: &[Layer]) -> Vec<bool> {
        ls.iter().map(|l| l.trainable).collect()
    }

    #[test]
    fn freeze_all_marks_everything_untrainable() {
        let mut ls = layers(4);
        FreezePolicy::FreezeAll.apply(&mut ls);
        assert_eq!(flags(&ls), vec![false; 4]);
    }

    #[test]
    fn freeze_all_but_k_keeps_last_k() {
        let mut ls = layers(5);
        FreezePolicy::freeze_all_but(2).unwrap().apply(&mut ls);
        assert_eq!(flags(&ls), vec![false, false, false, true, true]);
    }

    #[test]
    fn k_at_or_beyond_layer_count_keeps_all_trainable() {
        for k in [3, 10] {
            let mut ls = layers(3);
            FreezePolicy::freeze_all_but(k).unwrap().apply(&mut ls);
            assert_eq!(flags(&ls), vec![true; 3]);
        }
    }

    #[test]
    fn zero_and_negative_k_are_rejected() {
        for k in [0, -1, -100] {
            assert!(matches!(FreezePolicy::freeze_all_but(k), Err(FlowError::InvalidFreezePolicy(_))));
        }
    }

    #[test]
    fn reapplying_overrides_previous_flags() {
        let mut ls = layers(3);
        FreezePolicy::FreezeAll.apply(&mut ls);
        FreezePolicy::FreezeAllBut(1).apply(&mut ls);
        assert_eq!(flags(&ls), vec![false, false, true]);
    }

    #[test]
    fn config_flags() {
        assert_eq!(FreezePolicy::from_flags(true, Some(3)).unwrap(), FreezePolicy::FreezeAll);
        assert_eq!(FreezePolicy::from_flags(false, Some(3)).unwrap(), FreezePolicy::FreezeAllBut(3));
        assert!(FreezePolicy::from_flags(false, None).is_err());
        assert!(FreezePolicy::from_flags(false, Some(0)).is_err());
    }
}
