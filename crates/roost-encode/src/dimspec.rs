//! Non-incremental dimspec export.
//!
//! Writes the pigeonhole family as a four-section transition system over a
//! fixed per-step variable block: `i` (initial), `u` (universal), `g` (goal)
//! and `t` (transition). Step 0 carries one `pigeon_in_hole` and one
//! `future_hole` variable per pigeon; every later step shifts the whole block
//! by `2 * num_pigeons`. A pigeon whose `future_hole` flag is set at step `s`
//! still needs a hole beyond `s`; the goal forbids any open future, which is
//! impossible with `num_pigeons` pigeons and one hole per step fewer than
//! that.

use crate::config::EncoderConfig;
use roost_base::{Lit, Result, VarAllocator, VarFamily};
use std::io::Write;

/// Dimspec exporter for the pigeonhole family.
pub struct Dimspec {
    num_pigeons: u32,
    pigeon_in_hole: VarFamily,
    future_hole: VarFamily,
}

impl Dimspec {
    /// Builds the exporter, allocating the step-0 variable block.
    pub fn new(cfg: &EncoderConfig) -> Result<Self> {
        let mut alloc = VarAllocator::new();
        let pigeon_in_hole = alloc.family(&[cfg.num_pigeons])?;
        let future_hole = alloc.family(&[cfg.num_pigeons])?;
        Ok(Self {
            num_pigeons: cfg.num_pigeons,
            pigeon_in_hole,
            future_hole,
        })
    }

    /// Step width: two variables per pigeon.
    fn step_shift(&self) -> Lit {
        2 * self.num_pigeons as Lit
    }

    fn pigeon_in_hole(&self, pigeon: u32, step: u32) -> Lit {
        self.pigeon_in_hole.get(&[pigeon]) + step as Lit * self.step_shift()
    }

    fn future_hole(&self, pigeon: u32, step: u32) -> Lit {
        self.future_hole.get(&[pigeon]) + step as Lit * self.step_shift()
    }

    /// Initial section: every pigeon is in hole 0 or still needs one.
    fn initial(&self) -> Vec<Vec<Lit>> {
        (0..self.num_pigeons)
            .map(|p| vec![self.pigeon_in_hole(p, 0), self.future_hole(p, 0)])
            .collect()
    }

    /// Universal section: at most one pigeon per hole, every step.
    fn universal(&self) -> Vec<Vec<Lit>> {
        let mut clauses = Vec::new();
        for p in 0..self.num_pigeons {
            for q in 0..p {
                clauses.push(vec![
                    -self.pigeon_in_hole(p, 0),
                    -self.pigeon_in_hole(q, 0),
                ]);
            }
        }
        clauses
    }

    /// Goal section: no pigeon may still need a future hole.
    fn goal(&self) -> Vec<Vec<Lit>> {
        (0..self.num_pigeons)
            .map(|p| vec![-self.future_hole(p, 0)])
            .collect()
    }

    /// Transition section: a pigeon needing a hole either takes the next one
    /// or keeps needing one, and a pigeon placed earlier takes no new hole.
    fn transition(&self) -> Vec<Vec<Lit>> {
        let mut clauses = Vec::new();
        for p in 0..self.num_pigeons {
            clauses.push(vec![
                -self.future_hole(p, 0),
                self.pigeon_in_hole(p, 1),
                self.future_hole(p, 1),
            ]);
            clauses.push(vec![self.future_hole(p, 0), -self.pigeon_in_hole(p, 1)]);
            clauses.push(vec![self.future_hole(p, 0), -self.future_hole(p, 1)]);
        }
        clauses
    }

    fn write_section<W: Write>(
        &self,
        out: &mut W,
        name: char,
        num_vars: Lit,
        clauses: &[Vec<Lit>],
    ) -> Result<()> {
        writeln!(out, "{name} cnf {num_vars} {}", clauses.len())?;
        for clause in clauses {
            for lit in clause {
                write!(out, "{lit} ")?;
            }
            writeln!(out, "0")?;
        }
        Ok(())
    }

    /// Writes all four sections.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        let step = self.step_shift();
        self.write_section(out, 'i', step, &self.initial())?;
        self.write_section(out, 'u', step, &self.universal())?;
        self.write_section(out, 'g', step, &self.goal())?;
        self.write_section(out, 't', 2 * step, &self.transition())?;
        Ok(())
    }
}
