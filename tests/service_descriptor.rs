// crates.io
use serde_json::json;
// self
use adrive_auth::{
	service::{ClientIdentity, ServiceDescriptor, ServiceDescriptorError},
	url::Url,
	wire,
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse descriptor URL.")
}

#[test]
fn descriptor_loads_from_configuration() {
	let raw = json!({
		"endpoints": {
			"token": "https://auth.example.com/v2/account/token",
			"signing": "https://sign.example.com/alisign",
			"api_base": "https://api.example.com/",
		},
	})
	.to_string();
	let descriptor: ServiceDescriptor =
		wire::from_str("service descriptor", &raw).expect("Descriptor should decode.");

	descriptor.validate().expect("Decoded descriptor should validate.");

	assert_eq!(descriptor.identity, ClientIdentity::default());
	assert_eq!(
		descriptor.api_url("adrive/v3/file/list").expect("Path should resolve.").as_str(),
		"https://api.example.com/adrive/v3/file/list"
	);
}

#[test]
fn loaded_descriptors_still_require_tls() {
	let raw = json!({
		"endpoints": {
			"token": "https://auth.example.com/v2/account/token",
			"signing": "http://sign.example.com/alisign",
			"api_base": "https://api.example.com/",
		},
		"identity": "client=cli,app=adrive,version=v1",
	})
	.to_string();
	let descriptor: ServiceDescriptor =
		wire::from_str("service descriptor", &raw).expect("Descriptor should decode.");

	assert_eq!(descriptor.identity.canary(), "client=cli,app=adrive,version=v1");
	assert!(matches!(
		descriptor.validate(),
		Err(ServiceDescriptorError::InsecureEndpoint { endpoint: "signing", .. })
	));
}

#[test]
fn loopback_endpoints_may_use_plain_http() {
	let descriptor = ServiceDescriptor::builder()
		.token_endpoint(url("http://127.0.0.1:8080/v2/account/token"))
		.signing_endpoint(url("http://localhost:8081/alisign"))
		.api_base(url("http://[::1]:8082/"))
		.build()
		.expect("Loopback endpoints should be accepted.");

	assert_eq!(descriptor.endpoints.signing.port(), Some(8081));

	let err = ServiceDescriptor::builder()
		.token_endpoint(url("http://10.0.0.8/v2/account/token"))
		.signing_endpoint(url("https://sign.example.com/alisign"))
		.api_base(url("https://api.example.com/"))
		.build()
		.expect_err("Private but non-loopback hosts need TLS.");

	assert!(matches!(err, ServiceDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
}

#[test]
fn descriptor_round_trips_through_wire_codec() {
	let descriptor = ServiceDescriptor::aliyundrive(url("https://sign.example.com/alisign"))
		.expect("Default descriptor should build.");
	let encoded = wire::to_string(&descriptor).expect("Descriptor should encode.");
	let decoded: ServiceDescriptor =
		wire::from_str("service descriptor", &encoded).expect("Descriptor should decode.");

	assert_eq!(decoded, descriptor);
	assert!(encoded.contains("\"api_base\":\"https://api.aliyundrive.com/\""));
}
