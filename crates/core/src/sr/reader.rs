//! `SrReader`: read concentrations out of an SR matrix file previously
//! written by `SrMatrixWriter` (spec.md §4.3 "SR reader" implied by §7
//! `ErrAboveTop` and §9 Open Questions "The SR reader's `CacheSize` default
//! of 100").
//!
//! The writer's `[layer, source, receptor]` layout (spec.md §6) already
//! addresses a `(layer, source)` slot directly, so there's no row index to
//! build first; a lookup is one slice read keyed by `(cell, layer,
//! pollutant)`. A deduplicated, size-bounded cache (spec.md §9: "the
//! design requires only deduplicated, size-bounded caching") sits on top
//! since the same triple is looked up repeatedly when resolving many
//! receptor-side emissions against a handful of source cells.

use crate::error::{InMapError, Result};
use crate::sr::netcdf_writer::SR_POLLUTANTS;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default bound on the reader's concentration cache (spec.md §9 Open
/// Questions: "100 is an implementation choice").
pub const DEFAULT_CACHE_SIZE: usize = 100;

type LookupKey = (usize, usize, &'static str);

/// A concentration lookup result that may carry the `ErrAboveTop` soft
/// error alongside a usable value (spec.md §7: "`ErrAboveTop` ... is
/// returned alongside a usable result; callers may ignore").
#[derive(Debug, Clone)]
pub struct SrLookup {
    pub values: Vec<f64>,
    pub warning: Option<InMapError>,
}

struct Cache {
    capacity: usize,
    map: FxHashMap<LookupKey, Vec<f64>>,
    order: VecDeque<LookupKey>,
}

impl Cache {
    fn new(capacity: usize) -> Self {
        Cache {
            capacity: capacity.max(1),
            map: FxHashMap::default(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &LookupKey) -> Option<Vec<f64>> {
        self.map.get(key).cloned()
    }

    /// Insert a fresh entry, evicting the oldest one if at capacity. A
    /// repeated insert of an already-cached key is a no-op (dedup: the key
    /// never appears twice in `order`).
    fn insert(&mut self, key: LookupKey, values: Vec<f64>) {
        if self.map.contains_key(&key) {
            return;
        }
        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.push_back(key);
        self.map.insert(key, values);
    }
}

/// Resolve a caller-provided pollutant name to the `&'static str` spec.md
/// §6 fixes, so cache keys stay `Copy` instead of owned `String`s.
fn canonical_pollutant(name: &str) -> Result<&'static str> {
    SR_POLLUTANTS
        .iter()
        .find(|&&p| p == name)
        .copied()
        .ok_or_else(|| InMapError::MissingVariable(name.to_string()))
}

/// Reads per-receptor concentration vectors out of an SR matrix NetCDF
/// file, keyed by `(source_cell, layer, pollutant)`.
pub struct SrReader {
    file: netcdf::File,
    n_source: usize,
    n_receptor: usize,
    n_layers: usize,
    cache: Mutex<Cache>,
}

impl SrReader {
    /// Open `path` and read the fixed `layer`/`source`/`receptor`
    /// dimension sizes spec.md §6's schema guarantees are present.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_cache_size(path, DEFAULT_CACHE_SIZE)
    }

    pub fn open_with_cache_size(path: &str, cache_size: usize) -> Result<Self> {
        let file = netcdf::open(path).map_err(InMapError::NetCdf)?;

        let n_layers = file
            .dimension("layer")
            .ok_or_else(|| InMapError::MissingVariable("layer".to_string()))?
            .len();
        let n_source = file
            .dimension("source")
            .ok_or_else(|| InMapError::MissingVariable("source".to_string()))?
            .len();
        let n_receptor = file
            .dimension("receptor")
            .ok_or_else(|| InMapError::MissingVariable("receptor".to_string()))?
            .len();

        Ok(SrReader {
            file,
            n_source,
            n_receptor,
            n_layers,
            cache: Mutex::new(Cache::new(cache_size)),
        })
    }

    #[must_use]
    pub fn n_receptors(&self) -> usize {
        self.n_receptor
    }

    #[must_use]
    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    /// Per-receptor concentration of `pollutant` for a unit emission at
    /// `(cell_row, layer)` (spec.md §8 P6: each pollutant array has shape
    /// `[nLayers, Ncells, Ncells]`).
    pub fn concentrations(&self, cell_row: usize, layer: usize, pollutant: &str) -> Result<Vec<f64>> {
        let pollutant = canonical_pollutant(pollutant)?;
        let key = (cell_row, layer, pollutant);
        if let Some(cached) = self.cache.lock().expect("SR reader cache lock poisoned").get(&key) {
            return Ok(cached);
        }

        if cell_row >= self.n_source || layer >= self.n_layers {
            return Err(InMapError::LayerShapeMismatch {
                layer,
                found: cell_row,
                expected: self.n_source,
            });
        }

        let var = self
            .file
            .variable(pollutant)
            .ok_or_else(|| InMapError::MissingVariable(pollutant.to_string()))?;
        let values: Vec<f32> = var
            .get_values::<f32, _>(netcdf::Extents::from((
                layer..layer + 1,
                cell_row..cell_row + 1,
                0..self.n_receptor,
            )))
            .map_err(InMapError::NetCdf)?;
        if values.len() != self.n_receptor {
            return Err(InMapError::LayerShapeMismatch {
                layer,
                found: values.len(),
                expected: self.n_receptor,
            });
        }
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();

        self.cache
            .lock()
            .expect("SR reader cache lock poisoned")
            .insert(key, values.clone());
        Ok(values)
    }

    /// Resolve a plume height to an SR layer index given the grid's
    /// cumulative layer-top heights, then look up `pollutant`'s
    /// concentration. A plume above every layer top is allocated to the
    /// top layer and the usable result is returned alongside
    /// `ErrAboveTop` (spec.md §7, §8 S5: "allocates to the top SR layer,
    /// and returns the archived vector for that case").
    pub fn concentrations_for_emission(
        &self,
        cell_row: usize,
        plume_height: f64,
        layer_top_heights: &[f64],
        pollutant: &str,
    ) -> Result<SrLookup> {
        let (layer, above_top) = layer_for_height(plume_height, layer_top_heights, self.n_layers.saturating_sub(1));
        let values = self.concentrations(cell_row, layer, pollutant)?;
        let warning = above_top.then_some(InMapError::AboveTop);
        Ok(SrLookup { values, warning })
    }
}

/// Find the first layer whose cumulative top height is at or above
/// `plume_height`; if none exists, clamp to `max_layer` and flag
/// above-top (spec.md §7 `ErrAboveTop`).
fn layer_for_height(plume_height: f64, layer_top_heights: &[f64], max_layer: usize) -> (usize, bool) {
    for (k, &top) in layer_top_heights.iter().enumerate() {
        if plume_height <= top {
            return (k, false);
        }
    }
    (max_layer, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_for_height_picks_first_layer_whose_top_covers_the_plume() {
        let tops = vec![100.0, 300.0, 600.0];
        assert_eq!(layer_for_height(50.0, &tops, 2), (0, false));
        assert_eq!(layer_for_height(300.0, &tops, 2), (1, false));
        assert_eq!(layer_for_height(301.0, &tops, 2), (2, false));
    }

    #[test]
    fn layer_for_height_above_every_top_is_flagged_above_top() {
        // spec.md §8 S5: Height=800m with a grid topping out at 600m.
        let tops = vec![100.0, 300.0, 600.0];
        assert_eq!(layer_for_height(800.0, &tops, 2), (2, true));
    }

    #[test]
    fn cache_deduplicates_and_evicts_oldest_past_capacity() {
        let mut cache = Cache::new(2);
        cache.insert((0, 0, "PrimaryPM25"), vec![1.0]);
        cache.insert((0, 0, "PrimaryPM25"), vec![999.0]); // dedup: first insert wins
        cache.insert((1, 0, "PrimaryPM25"), vec![2.0]);
        cache.insert((2, 0, "PrimaryPM25"), vec![3.0]); // evicts (0,0,PrimaryPM25)

        assert_eq!(cache.get(&(0, 0, "PrimaryPM25")), None);
        assert_eq!(cache.get(&(1, 0, "PrimaryPM25")), Some(vec![2.0]));
        assert_eq!(cache.get(&(2, 0, "PrimaryPM25")), Some(vec![3.0]));
    }

    #[test]
    fn canonical_pollutant_rejects_unknown_names() {
        assert!(canonical_pollutant("PrimaryPM25").is_ok());
        assert!(canonical_pollutant("NotAPollutant").is_err());
    }
}
