use serde::Serialize;

/// An Alpha Vantage `query` function.
pub trait Method {
    const FUNCTION: &'static str;

    type Response: serde::de::DeserializeOwned;
    type Params: Serialize;
}
