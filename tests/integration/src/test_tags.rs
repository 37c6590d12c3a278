//! Tagging integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::types::{ParameterType, ResourceTypeForTagging, Tag};

    use crate::{cleanup_prefix, ssm_client, test_prefix};

    fn tag(key: &str, value: &str) -> Tag {
        Tag::builder()
            .key(key)
            .value(value)
            .build()
            .expect("tag should build")
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_add_list_and_remove_tags() {
        let client = ssm_client();
        let prefix = test_prefix("tags");
        let name = format!("{prefix}/tagged");

        client
            .put_parameter()
            .name(&name)
            .value("v")
            .r#type(ParameterType::String)
            .tags(tag("env", "home"))
            .send()
            .await
            .expect("put should succeed");

        client
            .add_tags_to_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(&name)
            .tags(tag("owner", "alice"))
            .send()
            .await
            .expect("add tags should succeed");

        let listed = client
            .list_tags_for_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(&name)
            .send()
            .await
            .expect("list tags should succeed");
        let mut keys: Vec<&str> = listed.tag_list().iter().map(Tag::key).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["env", "owner"]);

        client
            .remove_tags_from_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(&name)
            .tag_keys("env")
            .send()
            .await
            .expect("remove tags should succeed");

        let listed = client
            .list_tags_for_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(&name)
            .send()
            .await
            .expect("list tags should succeed");
        assert_eq!(listed.tag_list().len(), 1);
        assert_eq!(listed.tag_list()[0].key(), "owner");

        // Tagging does not create a new version.
        let got = client
            .get_parameter()
            .name(&name)
            .send()
            .await
            .expect("get should succeed");
        assert_eq!(got.parameter().map(|p| p.version()), Some(1));

        cleanup_prefix(&client, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_tags_on_non_parameter_resources() {
        let client = ssm_client();

        let result = client
            .list_tags_for_resource()
            .resource_type(ResourceTypeForTagging::Document)
            .resource_id("anything")
            .send()
            .await;
        assert!(result.is_err(), "only parameters carry tags");
    }
}
