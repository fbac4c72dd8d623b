//! # Generador de IDs
//! src/tasks/id.rs
//!
//! Emite IDs únicos y crecientes. Es un objeto explícito, propiedad de quien
//! crea tareas, para poder inyectar otro generador en tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Fuente de IDs de tareas
pub trait IdGenerator: Send + Sync {
    /// Devuelve un ID nuevo; nunca repite uno anterior
    fn next_id(&self) -> String;
}

/// Contador atómico: "1", "2", "3", ...
#[derive(Debug)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// El primer ID emitido será `last + 1`
    pub fn starting_after(last: u64) -> Self {
        Self {
            counter: AtomicU64::new(last),
        }
    }

    /// Próximo valor numérico
    pub fn next_value(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        self.next_value().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_ids_start_at_one() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id(), "1");
        assert_eq!(ids.next_id(), "2");
    }

    #[test]
    fn test_starting_after() {
        let ids = SequentialIds::starting_after(41);
        assert_eq!(ids.next_id(), "42");
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let ids = Arc::new(SequentialIds::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..500).map(|_| ids.next_value()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let values = handle.join().unwrap();
            // Dentro de un mismo hilo el orden de emisión es estrictamente creciente
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            for v in values {
                assert!(seen.insert(v), "duplicate id {}", v);
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    proptest! {
        #[test]
        fn prop_ids_strictly_increase(start in 0u64..1_000_000, n in 1usize..200) {
            let ids = SequentialIds::starting_after(start);
            let issued: Vec<u64> = (0..n).map(|_| ids.next_id().parse().unwrap()).collect();
            prop_assert_eq!(issued[0], start + 1);
            prop_assert!(issued.windows(2).all(|w| w[1] == w[0] + 1));
        }
    }
}
