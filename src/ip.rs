/// Source of the originating IP address of the request being checked.
///
/// Supplied by the hosting environment (web framework, RPC layer) and
/// injected into the client at construction.
pub trait IpSource: Send + Sync {
    fn caller_ip(&self) -> String;
}

/// Fixed address, for batch jobs and tests.
#[derive(Debug, Clone)]
pub struct StaticIp(pub String);

impl IpSource for StaticIp {
    fn caller_ip(&self) -> String {
        self.0.clone()
    }
}

impl<F> IpSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn caller_ip(&self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_source() {
        let source = || "10.0.0.8".to_string();
        assert_eq!(source.caller_ip(), "10.0.0.8");
        assert_eq!(StaticIp("127.0.0.1".to_string()).caller_ip(), "127.0.0.1");
    }
}
