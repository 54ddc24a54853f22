// src/services/order_number.rs

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use rand::Rng;

/// Gera números de pedido legíveis: `ORD-AAMMDD-HHMMSS-mmmSSSSRR`.
///
/// `mmm` são os milissegundos, `SSSS` um contador do processo e `RR` um
/// sufixo aleatório. A parte de tempo ordena os pedidos; o contador separa
/// pedidos do mesmo milissegundo e o sufixo reduz colisões entre processos.
/// A constraint única do banco decide o resto.
pub struct OrderNumberGenerator {
    sequence: AtomicU32,
}

impl Default for OrderNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderNumberGenerator {
    pub fn new() -> Self {
        Self { sequence: AtomicU32::new(0) }
    }

    pub fn next(&self) -> String {
        self.next_at(Utc::now())
    }

    pub fn next_at(&self, now: DateTime<Utc>) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) % 10_000;
        let suffix: u32 = rand::thread_rng().gen_range(0..100);
        format!(
            "ORD-{}-{:03}{:04}{:02}",
            now.format("%y%m%d-%H%M%S"),
            now.timestamp_subsec_millis() % 1_000,
            seq,
            suffix
        )
    }
}
