//! Board-agnostic cooperative kernel for the Metron sequencer firmware
//!
//! This crate contains the scheduling engine and application logic that
//! does not depend on specific hardware implementations:
//!
//! - Event taxonomy and the interrupt-safe event queue
//! - Resumable task abstraction and round-robin scheduler
//! - Wrap-safe timing helpers
//! - Control-voltage scaling math
//! - Sequencer engine (pattern, transport, step commands)
//!
//! # Concurrency model
//!
//! One logical thread of control runs all tasks, strictly cooperatively; a
//! second asynchronous context (interrupt handlers) runs input state
//! machines and pushes to the event queue. [`queue::EventQueue`] takes a
//! critical section around every push and pop so it can be shared between
//! the two contexts as a plain `&'static` reference. Any other object
//! touched from both contexts must be wrapped whole in
//! `critical_section::Mutex<RefCell<...>>` by the composing firmware, since
//! its state/timestamp pairs are compound updates. No lock is ever held
//! across a task suspension point.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod cv;
pub mod event;
pub mod queue;
pub mod scheduler;
pub mod sequencer;
pub mod task;
pub mod time;
