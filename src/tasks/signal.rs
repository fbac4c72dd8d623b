//! # Señales de Parada
//! src/tasks/signal.rs
//!
//! `StopSignal`: flag compartido que los workers y el monitor consultan en
//! puntos seguros. `ExitLatch`: cuenta hilos vivos y permite esperar a que
//! todos salgan con un plazo máximo.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct SignalState {
    triggered: Mutex<bool>,
    condvar: Condvar,
}

/// Señal de parada cooperativa, de una sola vez
#[derive(Clone)]
pub struct StopSignal {
    state: Arc<SignalState>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState {
                triggered: Mutex::new(false),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Activa la señal y despierta a quien esté esperando
    pub fn trigger(&self) {
        let mut triggered = self.state.triggered.lock();
        *triggered = true;
        self.state.condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.state.triggered.lock()
    }

    /// Duerme hasta `timeout` o hasta que se active la señal
    ///
    /// Devuelve `true` si la señal está activa al despertar. Sirve como
    /// "ticker" interrumpible.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut triggered = self.state.triggered.lock();
        while !*triggered {
            if self
                .state
                .condvar
                .wait_until(&mut triggered, deadline)
                .timed_out()
            {
                break;
            }
        }
        *triggered
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

struct LatchState {
    remaining: Mutex<usize>,
    condvar: Condvar,
}

/// Contador de hilos vivos (estilo WaitGroup)
#[derive(Clone)]
pub struct ExitLatch {
    state: Arc<LatchState>,
}

impl ExitLatch {
    pub fn new(count: usize) -> Self {
        Self {
            state: Arc::new(LatchState {
                remaining: Mutex::new(count),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Guard que descuenta un hilo al soltarse (también si el hilo entra en pánico)
    pub fn guard(&self) -> ExitGuard {
        ExitGuard {
            latch: self.clone(),
        }
    }

    fn count_down(&self) {
        let mut remaining = self.state.remaining.lock();
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.state.condvar.notify_all();
        }
    }

    pub fn remaining(&self) -> usize {
        *self.state.remaining.lock()
    }

    /// Espera a que el contador llegue a 0; devuelve lo que quede al vencer el plazo
    pub fn wait_timeout(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut remaining = self.state.remaining.lock();
        while *remaining > 0 {
            if self
                .state
                .condvar
                .wait_until(&mut remaining, deadline)
                .timed_out()
            {
                break;
            }
        }
        *remaining
    }
}

pub struct ExitGuard {
    latch: ExitLatch,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
