use super::parsing::{
    env_optional, env_or_default, is_supported_image_extension, parse_bool, parse_cors_origins,
    parse_environment, parse_positive_u64, parse_string_list,
};
use super::types::{
    ApiSettings, ConfigError, CorsSettings, OcrSettings, RuntimeSettings, ServerHost, ServerPort,
    ServerSettings, Settings, TelemetrySettings, UploadSettings, MAX_UPLOAD_SIZE_MB_LIMIT,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("SNAPQUIZ_HOST", "0.0.0.0");
        let port = env_or_default("SNAPQUIZ_PORT", "8000");

        let environment = parse_environment(
            env_optional("SNAPQUIZ_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("SNAPQUIZ_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "SnapQuiz API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let gemini_api_key = env_or_default("GEMINI_API_KEY", "");
        let gemini_base_url = env_or_default(
            "GEMINI_BASE_URL",
            "https://generativelanguage.googleapis.com/v1beta",
        );
        let gemini_model = env_or_default("GEMINI_MODEL", "gemini-2.5-flash");
        let ocr_request_timeout = parse_positive_u64(
            "OCR_REQUEST_TIMEOUT",
            env_or_default("OCR_REQUEST_TIMEOUT", "120"),
        )?;

        let max_upload_size_mb =
            parse_positive_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "10"))?;
        let allowed_image_extensions =
            parse_string_list(env_optional("ALLOWED_IMAGE_EXTENSIONS"), &["jpg", "jpeg", "png"]);

        let log_level = env_or_default("SNAPQUIZ_LOG_LEVEL", "info");
        let json = env_optional("SNAPQUIZ_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            cors: CorsSettings { origins: cors_origins },
            ocr: OcrSettings {
                api_key: gemini_api_key,
                base_url: gemini_base_url,
                model: gemini_model,
                request_timeout_seconds: ocr_request_timeout,
            },
            uploads: UploadSettings { max_upload_size_mb, allowed_image_extensions },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn ocr(&self) -> &OcrSettings {
        &self.ocr
    }

    pub(crate) fn uploads(&self) -> &UploadSettings {
        &self.uploads
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.max_upload_size_mb > MAX_UPLOAD_SIZE_MB_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "MAX_UPLOAD_SIZE_MB",
                value: self.uploads.max_upload_size_mb.to_string(),
            });
        }
        if self.uploads.allowed_image_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_IMAGE_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }
        for extension in &self.uploads.allowed_image_extensions {
            if !is_supported_image_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_IMAGE_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.ocr.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("GEMINI_API_KEY"));
        }

        Ok(())
    }
}
