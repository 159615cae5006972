//! DTMF Collector (spec.md §4.4, I4).
//!
//! Collection is purely timer-driven: there is no terminator digit. Every
//! digit extends the buffer; `dtmfFinal` expiry (handled by the Call
//! Orchestrator) is what finalizes the collected digits. Also mirrors the
//! gate pattern used elsewhere in the pipeline: once any digit arrives,
//! speech recognition is permanently disabled for the rest of the call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared sticky flag: once a digit is observed, speech stays disabled for
/// the remainder of the call regardless of what `DtmfCollector` does next.
#[derive(Debug, Clone, Default)]
pub struct SpeechDisabledGate {
    disabled: Arc<AtomicBool>,
}

impl SpeechDisabledGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            disabled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn disable(&self) {
        self.disabled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }
}

pub struct DtmfCollector {
    digits: String,
    gate: SpeechDisabledGate,
}

impl DtmfCollector {
    #[must_use]
    pub fn new(gate: SpeechDisabledGate) -> Self {
        Self {
            digits: String::new(),
            gate,
        }
    }

    #[must_use]
    pub fn gate(&self) -> SpeechDisabledGate {
        self.gate.clone()
    }

    /// Feed one DTMF digit. Appends it to the buffer and sticks the
    /// speech-disabled gate; finalization is decided entirely by the
    /// `dtmfFinal` timer, not by this method.
    pub fn on_digit(&mut self, digit: char) {
        self.gate.disable();
        self.digits.push(digit);
    }

    #[must_use]
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Takes the collected digits and clears the buffer.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_digits_with_no_terminator() {
        let mut collector = DtmfCollector::new(SpeechDisabledGate::new());
        collector.on_digit('1');
        collector.on_digit('2');
        collector.on_digit('3');
        assert_eq!(collector.digits(), "123");
        assert_eq!(collector.take(), "123");
        assert!(collector.digits().is_empty());
    }

    #[test]
    fn first_digit_sticks_the_speech_disabled_gate() {
        let gate = SpeechDisabledGate::new();
        let mut collector = DtmfCollector::new(gate.clone());
        assert!(!gate.is_disabled());
        collector.on_digit('5');
        assert!(gate.is_disabled());
    }

    #[test]
    fn gate_stays_disabled_after_taking_a_collection() {
        let gate = SpeechDisabledGate::new();
        let mut collector = DtmfCollector::new(gate.clone());
        collector.on_digit('1');
        collector.take();
        assert!(gate.is_disabled());
    }
}
