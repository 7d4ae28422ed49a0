use std::collections::HashMap;

/// Where the spectral filter computes for a given tensor's device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterPlacement {
    /// The tensor's own execution context supports complex-valued FFTs.
    Native,
    /// Complex FFTs are unavailable there; filter on the host and copy back.
    Host,
}

/// Host-supplied capability query: whether an execution context supports
/// complex-valued frequency-domain transforms.
pub trait DeviceProbe {
    fn supports_complex_fft(&self, device: &str) -> bool;
}

/// The host CPU always does.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuProbe;

impl DeviceProbe for CpuProbe {
    fn supports_complex_fft(&self, _device: &str) -> bool {
        true
    }
}

/// Memoizes the placement decision per distinct device identifier, so each
/// device is probed at most once per process.
#[derive(Debug, Default)]
pub struct PlacementCache {
    cached: HashMap<String, FilterPlacement>,
}

impl PlacementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, probe: &dyn DeviceProbe, device: &str) -> FilterPlacement {
        if let Some(&placement) = self.cached.get(device) {
            return placement;
        }
        let placement = if probe.supports_complex_fft(device) {
            FilterPlacement::Native
        } else {
            tracing::debug!(device, "no complex FFT support, filtering falls back to host");
            FilterPlacement::Host
        };
        self.cached.insert(device.to_string(), placement);
        placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingProbe {
        calls: Cell<u32>,
        supported: bool,
    }

    impl DeviceProbe for CountingProbe {
        fn supports_complex_fft(&self, _device: &str) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.supported
        }
    }

    #[test]
    fn probe_runs_at_most_once_per_device() {
        let probe = CountingProbe {
            calls: Cell::new(0),
            supported: false,
        };
        let mut cache = PlacementCache::new();
        for _ in 0..5 {
            assert_eq!(cache.resolve(&probe, "mps"), FilterPlacement::Host);
        }
        assert_eq!(probe.calls.get(), 1);

        assert_eq!(cache.resolve(&probe, "mps:1"), FilterPlacement::Host);
        assert_eq!(probe.calls.get(), 2);
    }

    #[test]
    fn cpu_probe_keeps_native_placement() {
        let mut cache = PlacementCache::new();
        assert_eq!(cache.resolve(&CpuProbe, "cpu"), FilterPlacement::Native);
    }
}
