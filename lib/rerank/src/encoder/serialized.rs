use parking_lot::Mutex;
use shelfmate_core::{Embedding, Result, TextEncoder};

/// Encoder that needs exclusive access to its model state
///
/// Typical for inference sessions that keep scratch buffers between calls.
pub trait EncoderMut: Send {
    fn encode_mut(&mut self, texts: &[String]) -> Result<Vec<Embedding>>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Shares an [`EncoderMut`] across threads by serializing every call
/// through a single lock; concurrent requests queue on the mutex.
pub struct SerializedEncoder<E: EncoderMut> {
    inner: Mutex<E>,
    dimension: usize,
    model_name: String,
}

impl<E: EncoderMut> SerializedEncoder<E> {
    pub fn new(encoder: E) -> Self {
        let dimension = encoder.dimension();
        let model_name = encoder.model_name().to_string();
        Self {
            inner: Mutex::new(encoder),
            dimension,
            model_name,
        }
    }

    pub fn into_inner(self) -> E {
        self.inner.into_inner()
    }
}

impl<E: EncoderMut> TextEncoder for SerializedEncoder<E> {
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.inner.lock().encode_mut(texts)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// Counts calls; `&mut self` makes it unusable without the wrapper
    struct CountingEncoder {
        calls: usize,
    }

    impl EncoderMut for CountingEncoder {
        fn encode_mut(&mut self, texts: &[String]) -> Result<Vec<Embedding>> {
            self.calls += 1;
            Ok(texts.iter().map(|_| Embedding::new(vec![1.0, 0.0])).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_metadata_forwarded() {
        let encoder = SerializedEncoder::new(CountingEncoder { calls: 0 });
        assert_eq!(encoder.dimension(), 2);
        assert_eq!(encoder.model_name(), "counting");
    }

    #[test]
    fn test_concurrent_calls_are_serialized() {
        let encoder = Arc::new(SerializedEncoder::new(CountingEncoder { calls: 0 }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let encoder = encoder.clone();
                thread::spawn(move || encoder.encode(&["a".to_string(), "b".to_string()]).unwrap().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }

        let encoder = Arc::try_unwrap(encoder).ok().unwrap();
        assert_eq!(encoder.into_inner().calls, 8);
    }
}
