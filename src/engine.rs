use std::time::Instant;

use log::warn;

use crate::collector::Collector;
use crate::constants::{NO_SYMBOL, OUTPUT_BUFFER_CAPACITY, TIME_CUTOFF_CHECK_INTERVAL, TRANSITION_TARGET_TABLE_START};
use crate::flag::{push_state, FlagState};
use crate::options::LookupOptions;
use crate::transducer::Transducer;
use crate::transition_table::SymbolTransition;
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};

/// Result of one `lookup` call. Construction-time failures are `Err`s (see
/// `error::Error`); everything that can go wrong per-call is a flag here instead,
/// per the propagation policy: a lookup never fails, it reports.
#[derive(Debug, Clone, Default)]
pub struct LookupResult {
    pub analyses: Vec<Vec<String>>,
    /// Input contained a byte sequence no alphabet symbol prefixes.
    pub tokenization_failed: bool,
    /// `time_cutoff_seconds` was exceeded; `analyses` holds a partial result.
    pub timed_out: bool,
    /// The transducer is weighted and flag-bearing and `options.unique` was set;
    /// this collector combination is not implemented (see DESIGN.md).
    pub unsupported: bool,
}

pub fn lookup(transducer: &Transducer, input: &str, options: &LookupOptions) -> LookupResult {
    let weighted = transducer.is_weighted();
    let has_flags = transducer.alphabet().has_flags();

    if weighted && has_flags && options.unique {
        return LookupResult { unsupported: true, ..Default::default() };
    }

    let mut symbols = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut cursor = 0usize;
    while cursor < bytes.len() {
        let sym = transducer.tokenizer().find_next_key(bytes, &mut cursor);
        if sym == NO_SYMBOL {
            return LookupResult { tokenization_failed: true, ..Default::default() };
        }
        symbols.push(sym);
    }
    symbols.push(NO_SYMBOL);

    let mut search = Search::new(transducer, &symbols, weighted, has_flags, options);
    search.run();

    if search.limit_reached {
        warn!("lookup hit time_cutoff_seconds; returning partial results");
    }

    LookupResult {
        analyses: search.collector.finish(options),
        tokenization_failed: false,
        timed_out: search.limit_reached,
        unsupported: false,
    }
}

struct Search<'a> {
    transducer: &'a Transducer,
    input: &'a [SymbolNumber],
    output: [SymbolNumber; OUTPUT_BUFFER_CAPACITY],
    flag_aware: bool,
    weight: Weight,
    flag_stack: Vec<FlagState>,
    collector: Collector,
    time_cutoff: f64,
    call_counter: u64,
    start: Instant,
    limit_reached: bool,
}

impl<'a> Search<'a> {
    fn new(
        transducer: &'a Transducer,
        input: &'a [SymbolNumber],
        weighted: bool,
        has_flags: bool,
        options: &LookupOptions,
    ) -> Search<'a> {
        let state_size = transducer.alphabet().state_size();
        Search {
            transducer,
            input,
            output: [NO_SYMBOL; OUTPUT_BUFFER_CAPACITY],
            flag_aware: has_flags,
            weight: 0.0,
            flag_stack: vec![FlagState::new(state_size)],
            collector: Collector::new(weighted, options.unique),
            time_cutoff: options.time_cutoff_seconds,
            call_counter: 0,
            start: Instant::now(),
            limit_reached: false,
        }
    }

    fn run(&mut self) {
        self.step(0, 0, 0);
    }

    fn step(&mut self, cursor_in: usize, cursor_out: usize, i: TransitionTableIndex) {
        if cursor_out >= OUTPUT_BUFFER_CAPACITY {
            // Only defense against epsilon cycles: the header flags are logged as
            // warnings at header-parse time, not re-checked here.
            return;
        }

        if self.time_cutoff > 0.0 {
            if self.limit_reached {
                return;
            }
            self.call_counter += 1;
            if self.call_counter % TIME_CUTOFF_CHECK_INTERVAL == 0
                && self.start.elapsed().as_secs_f64() > self.time_cutoff
            {
                self.limit_reached = true;
                return;
            }
        }

        if i >= TRANSITION_TARGET_TABLE_START {
            let j = i - TRANSITION_TARGET_TABLE_START;
            self.epsilon_transitions_loop(cursor_in, cursor_out, j + 1);

            if self.input[cursor_in] == NO_SYMBOL {
                self.output[cursor_out] = NO_SYMBOL;
                if self.transducer.transition_table().is_final(j) {
                    let w = self.transducer.transition_table().weight(j).unwrap_or(0.0);
                    self.weight += w;
                    self.emit(cursor_out);
                    self.weight -= w;
                }
                return;
            }

            let s = self.input[cursor_in];
            self.find_transitions_loop(cursor_in + 1, cursor_out, j + 1, s);
        } else {
            if let Some(0) = self.transducer.index_table().raw_input_symbol(i + 1) {
                if let Some(target) = self.transducer.index_table().target(i + 1) {
                    self.epsilon_transitions_loop(cursor_in, cursor_out, target - TRANSITION_TARGET_TABLE_START);
                }
            }

            if self.input[cursor_in] == NO_SYMBOL {
                self.output[cursor_out] = NO_SYMBOL;
                if self.transducer.index_table().is_final(i) {
                    let w = self.transducer.index_table().final_weight(i).unwrap_or(0.0);
                    self.weight += w;
                    self.emit(cursor_out);
                    self.weight -= w;
                }
                return;
            }

            let s = self.input[cursor_in];
            let slot = i + 1 + u32::from(s);
            if self.transducer.index_table().raw_input_symbol(slot) == Some(s) {
                if let Some(target) = self.transducer.index_table().target(slot) {
                    self.find_transitions_loop(
                        cursor_in + 1,
                        cursor_out,
                        target - TRANSITION_TARGET_TABLE_START,
                        s,
                    );
                }
            }
        }
    }

    /// Explores the epsilon closure (and, for a flag-bearing alphabet, the
    /// flag-diacritic transitions interleaved with it) starting at transition
    /// table index `start`. Stops at the first transition that is neither.
    fn epsilon_transitions_loop(&mut self, cursor_in: usize, cursor_out: usize, start: TransitionTableIndex) {
        let mut j = start;
        loop {
            match self.transducer.transition_table().input_symbol(j) {
                Some(0) => {
                    let t = self.transducer.transition_table().symbol_transition(j);
                    self.take_transition(cursor_in, cursor_out, t);
                    j += 1;
                }
                Some(sym) if self.flag_aware => {
                    let op = self.transducer.alphabet().operation(sym);
                    match op {
                        Some(op) => {
                            let top = self.flag_stack.last().expect("flag stack never empty");
                            if let Some(next_state) = push_state(top, op) {
                                self.flag_stack.push(next_state);
                                let t = self.transducer.transition_table().symbol_transition(j);
                                self.take_transition(cursor_in, cursor_out, t);
                                self.flag_stack.pop();
                            }
                            j += 1;
                        }
                        None => break,
                    }
                }
                _ => break,
            }
        }
    }

    /// Scans the transitions grouped under transition table index `start` for
    /// ones whose input symbol equals `symbol`, recursing into each match in
    /// turn. Transitions for one state are grouped by ascending input symbol, so
    /// the first mismatch means the group for `symbol` (if any) is exhausted.
    fn find_transitions_loop(
        &mut self,
        cursor_in: usize,
        cursor_out: usize,
        start: TransitionTableIndex,
        symbol: SymbolNumber,
    ) {
        let mut j = start;
        loop {
            match self.transducer.transition_table().input_symbol(j) {
                Some(sym) if sym == symbol => {
                    let t = self.transducer.transition_table().symbol_transition(j);
                    self.take_transition(cursor_in, cursor_out, t);
                    j += 1;
                }
                _ => break,
            }
        }
    }

    fn take_transition(&mut self, cursor_in: usize, cursor_out: usize, t: SymbolTransition) {
        self.output[cursor_out] = t.output;
        self.weight += t.weight;
        self.step(cursor_in, cursor_out + 1, t.target);
        self.weight -= t.weight;
    }

    fn emit(&mut self, cursor_out: usize) {
        let mut analysis = Vec::with_capacity(cursor_out);
        for &sym in &self.output[..cursor_out] {
            if let Some(text) = self.transducer.alphabet().symbol_text(sym) {
                if !text.is_empty() {
                    analysis.push(text.to_string());
                }
            }
        }
        self.collector.emit(analysis, self.weight);
    }
}
