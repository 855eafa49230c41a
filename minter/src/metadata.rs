use serde::{Deserialize, Serialize};

/// Off-chain NFT metadata following the Metaplex token-metadata JSON
/// schema. Optional fields are omitted from the serialized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<NftAttribute>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftAttribute {
    pub trait_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub files: Vec<NftFile>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
}

impl NftMetadata {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            image: image.into(),
            animation_url: None,
            external_url: None,
            attributes: None,
            properties: Some(Properties {
                files: Vec::new(),
                category: Category::Image,
            }),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_external_url(mut self, url: impl Into<String>) -> Self {
        self.external_url = Some(url.into());
        self
    }

    pub fn with_attribute(mut self, trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.get_or_insert_with(Vec::new).push(NftAttribute {
            trait_type: trait_type.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_file(mut self, uri: impl Into<String>, file_type: impl Into<String>) -> Self {
        let properties = self.properties.get_or_insert_with(|| Properties {
            files: Vec::new(),
            category: Category::Image,
        });
        properties.files.push(NftFile {
            uri: Some(uri.into()),
            file_type: Some(file_type.into()),
            cdn: None,
        });
        self
    }
}
