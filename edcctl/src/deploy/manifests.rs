//! Kubernetes manifests applied with `kubectl apply -f -`.

use edc_common::config::ClusterIssuerConfig;

/// Render the ACME ClusterIssuer. Callers only apply it when an email is set.
pub fn render_cluster_issuer(issuer: &ClusterIssuerConfig) -> String {
    let email = issuer.email.as_deref().unwrap_or_default();
    format!(
        "apiVersion: cert-manager.io/v1
kind: ClusterIssuer
metadata:
  name: {name}
spec:
  acme:
    server: {server}
    email: {email}
    privateKeySecretRef:
      name: {name}-account-key
    solvers:
      - http01:
          ingress:
            ingressClassName: {class}
",
        name = issuer.name,
        server = issuer.server,
        class = issuer.ingress_class,
    )
}
