use prometheus::{Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::models::SearchOrder;

/// Prometheus metrics for the tweet index
#[derive(Clone)]
pub struct IndexMetrics {
    // Counters
    pub tweets_posted: Counter,
    pub favorites: Counter,
    pub favorite_misses: Counter,
    pub searches_total: CounterVec,

    // Gauges
    pub indexed_tokens: Gauge,

    // Histograms
    pub search_results: Histogram,

    registry: Arc<Registry>,
}

impl IndexMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let tweets_posted = Counter::with_opts(Opts::new(
            "tweetdex_tweets_posted_total",
            "Total number of tweets posted",
        ))?;
        registry.register(Box::new(tweets_posted.clone()))?;

        let favorites = Counter::with_opts(Opts::new(
            "tweetdex_favorites_total",
            "Total number of favorites applied",
        ))?;
        registry.register(Box::new(favorites.clone()))?;

        let favorite_misses = Counter::with_opts(Opts::new(
            "tweetdex_favorite_misses_total",
            "Favorites rejected because the tweet id is unknown",
        ))?;
        registry.register(Box::new(favorite_misses.clone()))?;

        let searches_total = CounterVec::new(
            Opts::new("tweetdex_searches_total", "Total number of searches by order"),
            &["order"],
        )?;
        registry.register(Box::new(searches_total.clone()))?;

        let indexed_tokens = Gauge::with_opts(Opts::new(
            "tweetdex_indexed_tokens",
            "Number of distinct tokens in the index",
        ))?;
        registry.register(Box::new(indexed_tokens.clone()))?;

        let search_results = Histogram::with_opts(
            HistogramOpts::new("tweetdex_search_results", "Number of tweets returned per search")
                .buckets(vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0]),
        )?;
        registry.register(Box::new(search_results.clone()))?;

        Ok(Self {
            tweets_posted,
            favorites,
            favorite_misses,
            searches_total,
            indexed_tokens,
            search_results,
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a post and the resulting number of distinct tokens
    pub fn record_post(&self, token_count: usize) {
        self.tweets_posted.inc();
        self.indexed_tokens.set(token_count as f64);
    }

    /// Record a favorite attempt
    pub fn record_favorite(&self, found: bool) {
        if found {
            self.favorites.inc();
        } else {
            self.favorite_misses.inc();
        }
    }

    pub fn record_search(&self, order: SearchOrder, results: usize) {
        self.searches_total
            .with_label_values(&[order.as_str()])
            .inc();
        self.search_results.observe(results as f64);
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_render() {
        let metrics = IndexMetrics::new().unwrap();

        metrics.record_post(3);
        metrics.record_post(4);
        metrics.record_favorite(true);
        metrics.record_favorite(false);
        metrics.record_search(SearchOrder::Popular, 2);
        metrics.record_search(SearchOrder::Chronological, 0);

        assert_eq!(metrics.tweets_posted.get(), 2.0);
        assert_eq!(metrics.indexed_tokens.get(), 4.0);
        assert_eq!(metrics.favorites.get(), 1.0);
        assert_eq!(metrics.favorite_misses.get(), 1.0);
        assert_eq!(
            metrics.searches_total.with_label_values(&["popular"]).get(),
            1.0
        );
        assert_eq!(metrics.search_results.get_sample_count(), 2);

        let text = metrics.render().unwrap();
        assert!(text.contains("tweetdex_tweets_posted_total 2"));
        assert!(text.contains(r#"tweetdex_searches_total{order="chronological"} 1"#));
    }
}
