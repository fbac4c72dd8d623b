//! # Registro de Tareas
//! src/tasks/registry.rs
//!
//! Almacén thread-safe de registros por clave. Disciplina lectores-escritor:
//! muchas lecturas en paralelo, una sola escritura a la vez.
//!
//! Todas las lecturas devuelven copias, así quien consulta nunca ve una
//! escritura a medias aunque un worker actualice la misma tarea.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Registro genérico clave -> valor
pub struct Registry<K, V> {
    entries: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Inserta o sobrescribe sin condiciones
    pub fn set(&self, key: K, value: V) {
        self.entries.write().insert(key, value);
    }

    /// Copia del valor, `None` si la clave no existe
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    /// Snapshot de todos los valores en un instante
    pub fn get_all(&self) -> Vec<V> {
        self.entries.read().values().cloned().collect()
    }

    /// Read-modify-write atómico
    ///
    /// Aplica `transform` al valor actual y guarda el resultado bajo el mismo
    /// lock de escritura. Devuelve `false` (sin crear nada) si la clave no
    /// existe. `transform` no debe volver a llamar al registro.
    pub fn update<F>(&self, key: &K, transform: F) -> bool
    where
        F: FnOnce(&V) -> V,
    {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(current) => {
                *current = transform(current);
                true
            }
            None => false,
        }
    }

    /// Elimina una entrada
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().remove(key)
    }

    /// Conserva solo las entradas que cumplen `keep`; devuelve cuántas se eliminaron
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|k, v| keep(k, v));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for Registry<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// Los clones comparten el mismo estado
impl<K, V> Clone for Registry<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}
