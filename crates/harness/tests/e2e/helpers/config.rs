//! 테스트 설정 빌더
//!
//! GPG 키 파일을 임시 파일로 만들고, 그 경로를 가리키는 [`SatprobeConfig`]를 제공합니다.

use std::io::Write;

use tempfile::NamedTempFile;

use satprobe_core::config::{LdapFixtureConfig, SatprobeConfig};

/// 저장소 탐색 시작 URL
pub const DISCOVERY_URL: &str = "http://repos.example.com/discovery/";

/// 탐색 결과에서 선택할 저장소
pub const DISCOVERY_REPO: &str = "fakerepo01";

const KEY: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nmQENBFake\n-----END PGP PUBLIC KEY BLOCK-----\n";

/// 키 파일과 설정 묶음 (키 파일은 값이 살아있는 동안 유지)
pub struct TestEnv {
    pub config: SatprobeConfig,
    _key_file: NamedTempFile,
}

impl TestEnv {
    pub fn new() -> Self {
        let mut key_file = NamedTempFile::new().expect("create key file");
        key_file.write_all(KEY.as_bytes()).expect("write key file");

        let mut config = SatprobeConfig::default();
        config.fixtures.gpg_key_file = key_file.path().display().to_string();
        config.fixtures.yum_repo_url_1 = "http://repos.example.com/signed/".to_owned();
        config.fixtures.yum_repo_url_2 = "http://repos.example.com/unsigned/".to_owned();
        config.fixtures.discovery_url = DISCOVERY_URL.to_owned();
        config.fixtures.discovery_repo_name = DISCOVERY_REPO.to_owned();
        config.naming.seed = Some(20_240_101);

        Self {
            config,
            _key_file: key_file,
        }
    }

    /// AD 픽스처 설정
    #[allow(dead_code)]
    pub fn with_ldap(mut self) -> Self {
        self.config.ldap = ldap_fixture("ad.example.com", "DC=example,DC=com");
        self
    }

    /// IdM 픽스처 설정
    #[allow(dead_code)]
    pub fn with_ipa(mut self) -> Self {
        self.config.ipa = ldap_fixture("ipa.example.com", "dc=ipa,dc=example,dc=com");
        self
    }

    #[allow(dead_code)]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.naming.seed = Some(seed);
        self
    }
}

fn ldap_fixture(hostname: &str, base_dn: &str) -> LdapFixtureConfig {
    LdapFixtureConfig {
        hostname: hostname.to_owned(),
        username: "binder".to_owned(),
        password: "secret".to_owned(),
        base_dn: base_dn.to_owned(),
        group_base_dn: format!("ou=groups,{base_dn}"),
    }
}
