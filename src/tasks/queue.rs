//! # Cola de Trabajo Acotada
//! src/tasks/queue.rs
//!
//! Cola FIFO thread-safe de capacidad fija que desacopla a quien envía
//! tareas de los workers que las procesan.
//!
//! - `enqueue` bloquea mientras la cola está llena (backpressure).
//! - `try_enqueue` rechaza de inmediato si está llena.
//! - `dequeue` bloquea hasta que haya un elemento o la cola se cierre y vacíe.
//! - `close` es de una sola vez: los consumidores terminan de drenar lo que
//!   queda y luego ven fin de stream. Encolar después de cerrar es un error
//!   reportado, no un pánico.
//!
//! El flag `closed` vive bajo el mismo mutex que el buffer, así no hay carrera
//! entre "cerrar" y "encolar".

use crate::error::QueueError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Estado protegido por el mutex
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<QueueState<T>>,

    /// Se notifica cuando entra un elemento o se cierra la cola
    not_empty: Condvar,

    /// Se notifica cuando sale un elemento o se cierra la cola
    not_full: Condvar,

    capacity: usize,
}

/// Resultado de un `dequeue_timeout`
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued<T> {
    /// Se obtuvo un elemento
    Item(T),

    /// Venció el plazo con la cola abierta y vacía
    TimedOut,

    /// La cola está cerrada y ya no quedan elementos
    Closed,
}

/// Cola FIFO acotada
pub struct WorkQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> WorkQueue<T> {
    /// Crea una cola con capacidad máxima
    ///
    /// Una capacidad de 0 se trata como 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    items: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Encola bloqueando mientras la cola esté llena
    pub fn enqueue(&self, item: T) -> Result<(), QueueError> {
        self.enqueue_with(item, || {})
    }

    /// Igual que `enqueue`, pero ejecuta `on_accept` bajo el lock de la cola
    /// justo antes de insertar
    ///
    /// Si la cola se cierra mientras se espera, `on_accept` no corre. Ningún
    /// consumidor puede ver el elemento antes de que `on_accept` termine.
    pub fn enqueue_with<F>(&self, item: T, on_accept: F) -> Result<(), QueueError>
    where
        F: FnOnce(),
    {
        let mut state = self.shared.state.lock();
        loop {
            if state.closed {
                return Err(QueueError::Closed);
            }
            if state.items.len() < self.shared.capacity {
                break;
            }
            self.shared.not_full.wait(&mut state);
        }

        on_accept();
        state.items.push_back(item);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Intenta encolar sin bloquear
    pub fn try_enqueue(&self, item: T) -> Result<(), QueueError> {
        self.try_enqueue_with(item, || {})
    }

    /// Versión no bloqueante de `enqueue_with`
    pub fn try_enqueue_with<F>(&self, item: T, on_accept: F) -> Result<(), QueueError>
    where
        F: FnOnce(),
    {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }
        if state.items.len() >= self.shared.capacity {
            return Err(QueueError::Full {
                capacity: self.shared.capacity,
            });
        }

        on_accept();
        state.items.push_back(item);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Desencola bloqueando; `None` cuando la cola está cerrada y vacía
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.shared.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.shared.not_empty.wait(&mut state);
        }
    }

    /// Desencola esperando como máximo `timeout`
    pub fn dequeue_timeout(&self, timeout: Duration) -> Dequeued<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.shared.not_full.notify_one();
                return Dequeued::Item(item);
            }
            if state.closed {
                return Dequeued::Closed;
            }
            if self
                .shared
                .not_empty
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                // Último intento: pudo llegar algo justo al vencer el plazo
                return match state.items.pop_front() {
                    Some(item) => {
                        self.shared.not_full.notify_one();
                        Dequeued::Item(item)
                    }
                    None if state.closed => Dequeued::Closed,
                    None => Dequeued::TimedOut,
                };
            }
        }
    }

    /// Stream consumible: cada elemento lo recibe un solo consumidor
    pub fn iter(&self) -> QueueIter<'_, T> {
        QueueIter { queue: self }
    }

    /// Cierra la cola
    ///
    /// Devuelve `true` si esta llamada la cerró, `false` si ya estaba cerrada.
    pub fn close(&self) -> bool {
        let mut state = self.shared.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.shared.capacity
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Iterador bloqueante sobre la cola; termina cuando se cierra y vacía
pub struct QueueIter<'a, T> {
    queue: &'a WorkQueue<T>,
}

impl<T> Iterator for QueueIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.dequeue()
    }
}
