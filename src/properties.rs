use std::ffi::c_int;
use std::ptr::null;

use strum_macros::{EnumString, FromRepr, IntoStaticStr};

use crate::error::{check, Result};
use crate::ffi::{SPXHANDLE, SPXHR, SPXPROPERTYBAGHANDLE};
use crate::handle::SmartHandle;
use crate::marshal::{c_string, out_to_ret, NativeString};

/// Well-known property identifiers, with the numeric values the native
/// core assigns them.
///
/// The serialized form of each variant is the SDK's canonical property
/// name, so [`name`](PropertyId::name) and `FromStr` translate between
/// the two addressing schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, FromRepr, IntoStaticStr)]
#[non_exhaustive]
#[repr(i32)]
pub enum PropertyId {
    /// The service subscription key.
    #[strum(serialize = "SpeechServiceConnection_Key")]
    SubscriptionKey = 1000,
    /// The service endpoint URL.
    #[strum(serialize = "SpeechServiceConnection_Endpoint")]
    Endpoint = 1001,
    /// The service region.
    #[strum(serialize = "SpeechServiceConnection_Region")]
    Region = 1002,
    /// The authorization token, an alternative to the subscription key.
    #[strum(serialize = "SpeechServiceAuthorization_Token")]
    AuthorizationToken = 1003,
    /// The authorization scheme paired with the token.
    #[strum(serialize = "SpeechServiceAuthorization_Type")]
    AuthorizationType = 1004,
    /// The custom model or deployment id.
    #[strum(serialize = "SpeechServiceConnection_EndpointId")]
    EndpointId = 1005,
    /// The service host, an alternative to the full endpoint URL.
    #[strum(serialize = "SpeechServiceConnection_Host")]
    Host = 1006,
    /// Proxy host name.
    #[strum(serialize = "SpeechServiceConnection_ProxyHostName")]
    ProxyHostName = 1100,
    /// Proxy port.
    #[strum(serialize = "SpeechServiceConnection_ProxyPort")]
    ProxyPort = 1101,
    /// Proxy user name.
    #[strum(serialize = "SpeechServiceConnection_ProxyUserName")]
    ProxyUserName = 1102,
    /// Proxy password.
    #[strum(serialize = "SpeechServiceConnection_ProxyPassword")]
    ProxyPassword = 1103,
    /// The URL of the connection actually established, set by the core.
    #[strum(serialize = "SpeechServiceConnection_Url")]
    ConnectionUrl = 1104,
    /// The recognition mode requested from the service.
    #[strum(serialize = "SpeechServiceConnection_RecoMode")]
    RecognitionMode = 3000,
    /// The language recognized speech is transcribed in.
    #[strum(serialize = "SpeechServiceConnection_RecoLanguage")]
    RecognitionLanguage = 3001,
    /// The session id of the most recent recognition session.
    #[strum(serialize = "Speech_SessionId")]
    SessionId = 3002,
    /// Extra query parameters forwarded to the service verbatim.
    #[strum(serialize = "SpeechServiceConnection_UserDefinedQueryParameters")]
    UserDefinedQueryParameters = 3003,
    /// The language speech is synthesized in.
    #[strum(serialize = "SpeechServiceConnection_SynthLanguage")]
    SynthesisLanguage = 3100,
    /// The voice speech is synthesized with.
    #[strum(serialize = "SpeechServiceConnection_SynthVoice")]
    SynthesisVoice = 3101,
    /// The wire format of synthesized audio.
    #[strum(serialize = "SpeechServiceConnection_SynthOutputFormat")]
    SynthesisOutputFormat = 3102,
    /// Whether the service should return detailed recognition results.
    #[strum(serialize = "SpeechServiceResponse_RequestDetailedResultTrueFalse")]
    RequestDetailedResult = 4000,
    /// Whether the service should mask profanity in results.
    #[strum(serialize = "SpeechServiceResponse_RequestProfanityFilterTrueFalse")]
    RequestProfanityFilter = 4001,
    /// The raw JSON payload of a result.
    #[strum(serialize = "SpeechServiceResponse_JsonResult")]
    JsonResult = 5000,
    /// The raw JSON error payload of a failed result.
    #[strum(serialize = "SpeechServiceResponse_JsonErrorDetails")]
    JsonErrorDetails = 5001,
    /// End-to-end recognition latency in milliseconds, set by the core.
    #[strum(serialize = "SpeechServiceResponse_RecognitionLatencyMs")]
    RecognitionLatencyMs = 5002,
    /// File the native core writes its diagnostic log to.
    #[strum(serialize = "Speech_LogFilename")]
    LogFilename = 9001,
}

impl PropertyId {
    /// The SDK's canonical name for this property.
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Addresses one property, either by well-known id or by name.
///
/// Produced implicitly from a [`PropertyId`] or a `&str`, so call sites
/// read `bag.get(PropertyId::Region)` or `bag.get("CUSTOM-Header")`.
#[derive(Debug, Clone, Copy)]
pub enum PropertyKey<'a> {
    /// A well-known numeric id.
    Id(PropertyId),
    /// A property addressed by its string name.
    Name(&'a str),
}

impl From<PropertyId> for PropertyKey<'static> {
    fn from(id: PropertyId) -> Self {
        PropertyKey::Id(id)
    }
}

impl<'a> From<&'a str> for PropertyKey<'a> {
    fn from(name: &'a str) -> Self {
        PropertyKey::Name(name)
    }
}

// The native core addresses a property by id or by name, never both. The
// id slot carries this marker when a name is used.
const PROPERTY_BY_NAME: c_int = -1;

pub(crate) type BagGetterFn =
    unsafe extern "C" fn(SPXHANDLE, *mut SPXPROPERTYBAGHANDLE) -> SPXHR;

/// String-valued settings attached to a configuration, recognizer,
/// synthesizer or result.
///
/// A bag is a view into its owner: it holds its own native sub-handle,
/// which the owner releases when it closes. Reads and writes after that
/// point fail instead of touching freed native state.
pub struct PropertyBag {
    handle: SmartHandle,
}

impl PropertyBag {
    /// Fetches the property bag sub-handle of `owner`.
    pub(crate) fn open(owner: &SmartHandle, getter: BagGetterFn) -> Result<Self> {
        let api = crate::api()?;
        let howner = owner.get()?;
        let raw = unsafe { out_to_ret(|out| getter(howner, out))? };
        Ok(Self {
            handle: SmartHandle::new(raw, api.property_bag_release, "property bag")?,
        })
    }

    /// Reads a property. An unset property reads as the empty string.
    pub fn get<'k>(&self, key: impl Into<PropertyKey<'k>>) -> Result<String> {
        self.get_or(key, "")
    }

    /// Reads a property, substituting `default` when it is unset.
    pub fn get_or<'k>(&self, key: impl Into<PropertyKey<'k>>, default: &str) -> Result<String> {
        let api = crate::api()?;
        let hbag = self.handle.get()?;
        let (id, name) = split_key(key.into())?;
        let name_ptr = name.as_ref().map_or(null(), |n| n.as_ptr());
        let default = c_string(default, "property default")?;
        let raw =
            unsafe { (api.property_bag_get_string)(hbag, id, name_ptr, default.as_ptr()) };
        // The native core hands back an allocated copy, even of the
        // default; a null return means it had nothing to say.
        match unsafe { NativeString::from_raw(raw, api.property_bag_free_string) } {
            Some(value) => Ok(value.to_string_lossy()),
            None => Ok(default.to_string_lossy().into_owned()),
        }
    }

    /// Writes a property.
    pub fn set<'k>(&self, key: impl Into<PropertyKey<'k>>, value: &str) -> Result<()> {
        let api = crate::api()?;
        let hbag = self.handle.get()?;
        let (id, name) = split_key(key.into())?;
        let name_ptr = name.as_ref().map_or(null(), |n| n.as_ptr());
        let value = c_string(value, "property value")?;
        check(unsafe { (api.property_bag_set_string)(hbag, id, name_ptr, value.as_ptr()) })
    }

    /// Releases the native sub-handle. Further reads and writes fail.
    pub(crate) fn release(&self) {
        self.handle.release();
    }
}

fn split_key(key: PropertyKey<'_>) -> Result<(c_int, Option<std::ffi::CString>)> {
    match key {
        PropertyKey::Id(id) => Ok((id as c_int, None)),
        PropertyKey::Name(name) => {
            Ok((PROPERTY_BY_NAME, Some(c_string(name, "property name")?)))
        }
    }
}
