use serde::Serialize;

pub trait Method {
    type Response: serde::de::DeserializeOwned;
    type Params: Serialize;

    /// Endpoint URL; path segments may depend on the parameters.
    fn url(params: &Self::Params) -> String;
}
