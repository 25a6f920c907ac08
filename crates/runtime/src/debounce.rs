use foundation::time::Time;

/// Trailing-edge debouncer: the latest value becomes due once `delay_ms` has
/// passed without a newer one. The very first value is due immediately.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: f64,
    pending: Option<(T, Time)>,
    fired_once: bool,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            pending: None,
            fired_once: false,
        }
    }

    /// Replaces any pending value and restarts the delay.
    pub fn push(&mut self, value: T, now: Time) {
        let due = if self.fired_once {
            now.add_ms(self.delay_ms)
        } else {
            now
        };
        self.pending = Some((value, due));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value if its deadline has been reached.
    pub fn poll(&mut self, now: Time) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => {
                self.fired_once = true;
                self.pending.take().map(|(v, _)| v)
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use foundation::time::Time;

    #[test]
    fn first_value_is_immediate() {
        let mut d = Debouncer::new(150.0);
        d.push((800, 600), Time(0.0));
        assert_eq!(d.poll(Time(0.0)), Some((800, 600)));
        assert!(!d.is_pending());
    }

    #[test]
    fn later_values_wait_for_quiet_period() {
        let mut d = Debouncer::new(150.0);
        d.push(1, Time(0.0));
        d.poll(Time(0.0));

        d.push(2, Time(100.0));
        d.push(3, Time(200.0));
        assert_eq!(d.poll(Time(300.0)), None);
        assert_eq!(d.poll(Time(350.0)), Some(3));
        assert_eq!(d.poll(Time(400.0)), None);
    }
}
