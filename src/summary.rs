// Copyright (c) 2021  Teddy Wing
//
// This file is part of Clonehub.
//
// Clonehub is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Clonehub is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Clonehub. If not, see <https://www.gnu.org/licenses/>.


use std::fmt;

use crate::git;


/// Accumulated per-repository outcomes for a whole run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    cloned: usize,
    skipped: usize,
    failed: Vec<(String, anyhow::Error)>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, outcome: git::Outcome) {
        match outcome {
            git::Outcome::Cloned => self.cloned += 1,
            git::Outcome::Skipped => self.skipped += 1,
            git::Outcome::Failed(e) => self.failed.push((name.to_owned(), e)),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cloned, {} skipped, {} failed",
            self.cloned,
            self.skipped,
            self.failed.len(),
        )?;

        for (name, error) in &self.failed {
            write!(f, "\n{}: {:#}", name, error)?;
        }

        Ok(())
    }
}
