//! Nombres únicos con timestamp para artifacts (`tb_logs_at_Fri_Jan__5_09.03.07_2024`).
//!
//! La resolución es de un segundo: dos invocaciones dentro del mismo segundo
//! producen el mismo nombre. El reloj es inyectable para poder testear.

use chrono::{Local, NaiveDateTime};

/// Fuente de tiempo de pared.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Reloj local del sistema.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Reloj fijo (tests y re-ejecuciones deterministas).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Formato `asctime`: `Fri Jan  5 09:03:07 2024` (día con padding de espacio).
pub fn asctime(t: &NaiveDateTime) -> String {
    t.format("%a %b %e %H:%M:%S %Y").to_string()
}

/// `"{name}_at_{timestamp}"` con espacios → `_` y `:` → `.`.
pub fn unique_name(name: &str, clock: &dyn Clock) -> String {
    let timestamp = asctime(&clock.now()).replace(' ', "_").replace(':', ".");
    format!("{name}_at_{timestamp}")
}

/// `unique_name` con el reloj del sistema.
pub fn get_timestamp(name: &str) -> String {
    unique_name(name, &SystemClock)
}
