pub mod auto_select;
pub mod fetcher;
pub mod normalizer;
pub mod prober;
pub mod race;
pub mod resolver;
pub mod selector;

pub use auto_select::AutoSelectService;
pub use fetcher::{Fetch, FetchMethod, FetchOptions, FetchResponse, HttpFetcher, InterceptFetcher};
pub use normalizer::TreeNormalizer;
pub use prober::{LatencyProber, DEFAULT_PROBE_TIMEOUT};
pub use race::{LatencyRace, DEFAULT_RACE_TIMEOUT};
pub use resolver::{DownloadResolver, DEFAULT_FETCH_TIMEOUT};
pub use selector::{fastest_of, FastestSelector};
