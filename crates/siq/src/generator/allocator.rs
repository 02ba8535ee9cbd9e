/// Outcome of one allocation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Allocation {
    /// `serial` is reserved for the requested tick.
    Issued { serial: u16 },
    /// No serial is left for `tick` with the requested qualifier.
    Exhausted { tick: u64 },
    /// The requested tick is earlier than `last`, the newest tick issued.
    Behind { last: u64 },
}

/// Per-generator serial state.
///
/// Tracks the last issued tick together with the last issued low word
/// (`serial << qualifier_bits | qualifier`) rather than a bare counter.
/// Within one tick the next serial is the smallest whose word sorts after
/// the previous word, so ids stay strictly increasing as integers even when
/// consecutive calls use qualifiers of different widths. With a single
/// qualifier this degenerates to the usual `serial + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SerialAllocator {
    last: Option<(u64, u16)>,
}

impl SerialAllocator {
    pub(crate) const fn new() -> Self {
        Self { last: None }
    }

    /// State that continues after an already issued `(tick, word)`.
    pub(crate) const fn resume(tick: u64, word: u16) -> Self {
        Self {
            last: Some((tick, word)),
        }
    }

    pub(crate) const fn last_tick(&self) -> Option<u64> {
        match self.last {
            Some((tick, _)) => Some(tick),
            None => None,
        }
    }

    /// Reserves a serial for tick `now` next to a qualifier of `value` and
    /// `qualifier_bits` width, inside a low word of `word_bits` bits.
    ///
    /// State only changes on [`Allocation::Issued`].
    pub(crate) fn allocate(
        &mut self,
        now: u64,
        value: u16,
        qualifier_bits: u32,
        word_bits: u32,
    ) -> Allocation {
        debug_assert!(qualifier_bits < word_bits && word_bits <= 16);
        let max_serial = (1_u32 << (word_bits - qualifier_bits)) - 1;

        let serial = match self.last {
            Some((last, _)) if now < last => return Allocation::Behind { last },
            Some((last, word)) if now == last => {
                let mask = (1_u32 << qualifier_bits) - 1;
                let word = u32::from(word);
                let base = word >> qualifier_bits;
                if word & mask >= u32::from(value) {
                    base + 1
                } else {
                    base
                }
            }
            _ => 0,
        };

        if serial > max_serial {
            return Allocation::Exhausted { tick: now };
        }

        let serial = serial as u16;
        self.last = Some((now, (serial << qualifier_bits) | value));
        Allocation::Issued { serial }
    }
}
