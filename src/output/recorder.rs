//! Trajectory recording and CSV persistence
//!
//! One frame per recorded tick: time, total energy and every particle's
//! `[x, y, vx, vy]`. The CSV layout is
//! `t,E_total,x1,y1,vx1,vy1,...,xN,yN,vxN,vyN`, one row per frame.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::error::{Result, SimError};
use crate::simulation::energy::signed_relative_drift;
use crate::simulation::states::{Particle, State};

#[derive(Debug, Clone)]
pub struct Frame {
    pub t: f64,
    pub energy: f64,
    pub states: Vec<State>,
}

/// Summary of the recorded energy series
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyStatistics {
    pub initial: f64,
    pub last: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub max: f64,
    pub min: f64,
    pub drift: f64, // last - initial
    pub relative_drift: f64, // (last - initial) / |initial|, absolute when initial is zero
    pub frames: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TrajectoryRecorder {
    particle_count: usize,
    frames: Vec<Frame>,
}

impl TrajectoryRecorder {
    pub fn new(particle_count: usize) -> Self {
        Self {
            particle_count,
            frames: Vec::new(),
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn record(&mut self, t: f64, energy: f64, particles: &[Particle]) {
        self.frames.push(Frame {
            t,
            energy,
            states: particles.iter().map(Particle::state).collect(),
        });
    }

    /// `t,E_total,x1,y1,vx1,vy1,...`
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["t".to_string(), "E_total".to_string()];
        for i in 1..=self.particle_count {
            header.extend([format!("x{i}"), format!("y{i}"), format!("vx{i}"), format!("vy{i}")]);
        }
        header
    }

    /// Write all frames, creating parent directories as needed
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "{}", self.header().join(","))?;
        for frame in &self.frames {
            let mut row = vec![frame.t.to_string(), frame.energy.to_string()];
            for s in &frame.states {
                row.extend(s.iter().map(|c| c.to_string()));
            }
            writeln!(w, "{}", row.join(","))?;
        }
        w.flush()?;

        info!("wrote {} frames to {}", self.frames.len(), path.display());
        Ok(())
    }

    /// Load a recorder from a file written by [`write_csv`](Self::write_csv)
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut lines = reader.lines();

        let header = lines
            .next()
            .ok_or_else(|| SimError::Parse("empty CSV file".into()))??;
        let columns = header.split(',').count();
        if columns < 2 || (columns - 2) % 4 != 0 {
            return Err(SimError::Parse(format!("unexpected column count {columns}")));
        }
        let particle_count = (columns - 2) / 4;

        let mut recorder = Self::new(particle_count);
        for (line_no, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let values = line
                .split(',')
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|e| SimError::Parse(format!("row {}: {e}", line_no + 1)))
                })
                .collect::<Result<Vec<f64>>>()?;
            if values.len() != columns {
                return Err(SimError::Parse(format!(
                    "row {}: expected {columns} values, got {}",
                    line_no + 1,
                    values.len()
                )));
            }

            let states = values[2..].chunks_exact(4).map(State::from_column_slice).collect();
            recorder.frames.push(Frame {
                t: values[0],
                energy: values[1],
                states,
            });
        }
        Ok(recorder)
    }

    /// (xs, ys) of particle `index` over all frames
    pub fn trajectory(&self, index: usize) -> Result<(Vec<f64>, Vec<f64>)> {
        if index >= self.particle_count {
            return Err(SimError::ParticleIndex {
                index,
                count: self.particle_count,
            });
        }
        Ok(self.frames.iter().map(|f| (f.states[index][0], f.states[index][1])).unzip())
    }

    /// (times, energies)
    pub fn energy_history(&self) -> (Vec<f64>, Vec<f64>) {
        self.frames.iter().map(|f| (f.t, f.energy)).unzip()
    }

    pub fn statistics(&self) -> Option<EnergyStatistics> {
        let first = self.frames.first()?.energy;
        let last = self.frames.last()?.energy;
        let n = self.frames.len() as f64;

        let energies = self.frames.iter().map(|f| f.energy);
        let mean = energies.clone().sum::<f64>() / n;
        let variance = energies.clone().map(|e| (e - mean).powi(2)).sum::<f64>() / n;

        Some(EnergyStatistics {
            initial: first,
            last,
            mean,
            std_dev: variance.sqrt(),
            max: energies.clone().fold(f64::NEG_INFINITY, f64::max),
            min: energies.fold(f64::INFINITY, f64::min),
            drift: last - first,
            relative_drift: signed_relative_drift(first, last),
            frames: self.frames.len(),
        })
    }
}
