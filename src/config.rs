use std::ptr::null;

use crate::error::{Error, Result};
use crate::ffi::SPXSPEECHCONFIGHANDLE;
use crate::handle::SmartHandle;
use crate::marshal::{c_string, out_to_ret};
use crate::properties::{PropertyBag, PropertyId};
use crate::tts::SpeechSynthesisOutputFormat;

/// Service credentials and settings shared by recognizers and
/// synthesizers.
///
/// A configuration is a recipe, not a session: changing it after an
/// object was created from it does not affect that object. Most settings
/// live in the configuration's [property bag](PropertyBag); the typed
/// methods below cover the common ones.
pub struct SpeechConfig {
    bag: PropertyBag,
    handle: SmartHandle,
}

impl SpeechConfig {
    /// Creates a configuration from a subscription key and region.
    pub fn from_subscription(subscription: &str, region: &str) -> Result<Self> {
        let api = crate::api()?;
        let subscription = c_string(subscription, "subscription key")?;
        let region = c_string(region, "region")?;
        let raw = unsafe {
            out_to_ret(|out| {
                (api.speech_config_from_subscription)(out, subscription.as_ptr(), region.as_ptr())
            })?
        };
        Self::wrap(raw)
    }

    /// Creates a configuration from an explicit endpoint URL. The
    /// subscription key may be omitted when the endpoint carries its own
    /// authentication.
    pub fn from_endpoint(endpoint: &str, subscription: Option<&str>) -> Result<Self> {
        let api = crate::api()?;
        let endpoint = c_string(endpoint, "endpoint")?;
        let subscription = match subscription {
            Some(key) => Some(c_string(key, "subscription key")?),
            None => None,
        };
        let key_ptr = subscription.as_ref().map_or(null(), |k| k.as_ptr());
        let raw = unsafe {
            out_to_ret(|out| (api.speech_config_from_endpoint)(out, endpoint.as_ptr(), key_ptr))?
        };
        Self::wrap(raw)
    }

    /// Creates a configuration from an authorization token and region.
    /// The token expires; refresh it with
    /// [`set_authorization_token`](Self::set_authorization_token).
    pub fn from_authorization_token(token: &str, region: &str) -> Result<Self> {
        let api = crate::api()?;
        let token = c_string(token, "authorization token")?;
        let region = c_string(region, "region")?;
        let raw = unsafe {
            out_to_ret(|out| {
                (api.speech_config_from_authorization_token)(out, token.as_ptr(), region.as_ptr())
            })?
        };
        Self::wrap(raw)
    }

    fn wrap(raw: SPXSPEECHCONFIGHANDLE) -> Result<Self> {
        let api = crate::api()?;
        let handle = SmartHandle::new(raw, api.speech_config_release, "speech config")?;
        let bag = PropertyBag::open(&handle, api.speech_config_get_property_bag)?;
        Ok(Self { bag, handle })
    }

    /// The configuration's property bag.
    pub fn properties(&self) -> &PropertyBag {
        &self.bag
    }

    /// The language recognized speech is transcribed in, as a BCP-47 tag.
    pub fn speech_recognition_language(&self) -> Result<String> {
        self.bag.get(PropertyId::RecognitionLanguage)
    }

    /// Sets the language recognized speech is transcribed in.
    pub fn set_speech_recognition_language(&self, language: &str) -> Result<()> {
        self.bag.set(PropertyId::RecognitionLanguage, language)
    }

    /// The custom model deployment id, if one is set.
    pub fn endpoint_id(&self) -> Result<String> {
        self.bag.get(PropertyId::EndpointId)
    }

    /// Routes recognition to a custom model deployment.
    pub fn set_endpoint_id(&self, endpoint_id: &str) -> Result<()> {
        self.bag.set(PropertyId::EndpointId, endpoint_id)
    }

    /// The current authorization token.
    pub fn authorization_token(&self) -> Result<String> {
        self.bag.get(PropertyId::AuthorizationToken)
    }

    /// Replaces the authorization token. Objects already created from
    /// this configuration keep the token they were created with.
    pub fn set_authorization_token(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(Error::InvalidArg("authorization token must not be empty"));
        }
        self.bag.set(PropertyId::AuthorizationToken, token)
    }

    /// The language speech is synthesized in.
    pub fn speech_synthesis_language(&self) -> Result<String> {
        self.bag.get(PropertyId::SynthesisLanguage)
    }

    /// Sets the language speech is synthesized in.
    pub fn set_speech_synthesis_language(&self, language: &str) -> Result<()> {
        self.bag.set(PropertyId::SynthesisLanguage, language)
    }

    /// The voice speech is synthesized with.
    pub fn speech_synthesis_voice_name(&self) -> Result<String> {
        self.bag.get(PropertyId::SynthesisVoice)
    }

    /// Sets the voice speech is synthesized with.
    pub fn set_speech_synthesis_voice_name(&self, voice: &str) -> Result<()> {
        self.bag.set(PropertyId::SynthesisVoice, voice)
    }

    /// Sets the wire format synthesized audio is produced in.
    pub fn set_speech_synthesis_output_format(
        &self,
        format: SpeechSynthesisOutputFormat,
    ) -> Result<()> {
        self.bag.set(PropertyId::SynthesisOutputFormat, format.wire_name())
    }

    /// Routes service traffic through an HTTP proxy.
    pub fn set_proxy(&self, host: &str, port: u16) -> Result<()> {
        self.set_proxy_with_auth(host, port, None)
    }

    /// Routes service traffic through an HTTP proxy that requires
    /// credentials.
    pub fn set_proxy_with_auth(
        &self,
        host: &str,
        port: u16,
        credentials: Option<(&str, &str)>,
    ) -> Result<()> {
        if host.is_empty() {
            return Err(Error::InvalidArg("proxy host must not be empty"));
        }
        if port == 0 {
            return Err(Error::InvalidArg("proxy port must not be zero"));
        }
        self.bag.set(PropertyId::ProxyHostName, host)?;
        self.bag.set(PropertyId::ProxyPort, &port.to_string())?;
        if let Some((user, password)) = credentials {
            self.bag.set(PropertyId::ProxyUserName, user)?;
            self.bag.set(PropertyId::ProxyPassword, password)?;
        }
        Ok(())
    }

    pub(crate) fn handle(&self) -> &SmartHandle {
        &self.handle
    }
}
