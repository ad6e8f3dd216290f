//! 主机网络探测
//!
//! 安装完成后需要向用户报告服务的预期访问地址

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// 探测主机的首选出口 IP
///
/// Linux 上优先使用 `hostname -I` 的第一个地址（与安装脚本一致），
/// 失败时回退到 UDP 路由探测，最终回退 127.0.0.1
pub fn primary_ip() -> IpAddr {
    #[cfg(target_os = "linux")]
    {
        if let Ok(output) = std::process::Command::new("hostname").arg("-I").output() {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if let Some(ip) = stdout.split_whitespace().next() {
                    if let Ok(parsed) = ip.parse::<IpAddr>() {
                        return parsed;
                    }
                }
            }
        }
    }

    route_probe_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// UDP 路由探测：connect 不发包，只查询内核选择的本地地址
fn route_probe_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

/// 拼出服务访问地址
pub fn service_url(ip: IpAddr, port: u16) -> String {
    format!("http://{}:{}", ip, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_url_format() {
        let url = service_url(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)), 8000);
        assert_eq!(url, "http://192.168.1.10:8000");
    }

    #[test]
    fn test_primary_ip_always_resolves() {
        // 任何环境下都应返回一个可用地址（最差回退 127.0.0.1）
        let ip = primary_ip();
        assert!(ip.is_ipv4() || ip.is_ipv6());
    }
}
