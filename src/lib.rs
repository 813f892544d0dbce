//! # germline-builder
//!
//! 免疫受体胚系基因库编译器。
//!
//! 从带注释的 FASTA 等位基因集合出发，为每个基因选定参考等位基因，解析参考点
//! （锚点），并把其余等位基因编码为相对参考序列的突变集合，最终写入二进制基因库。
//!
//! - **头部解析**：等位基因名、基因名、功能/参考标记
//! - **锚点解析**：序列边界、固定偏移、正则引导搜索（可配置回退）
//! - **差异编码**：按锚点分段的全局比对
//! - **坐标投影**：去除非编码区后翻译为氨基酸坐标
//! - **报告**：核苷酸与氨基酸多序列比对文本
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use germline_builder::builder::{BuilderParams, GermlineBuilder, Locus};
//! use germline_builder::library::GermlineLibrary;
//!
//! let params = BuilderParams::load("trbv.toml")?;
//! let mut builder = GermlineBuilder::new(Locus::TRB, params);
//! builder.import_alleles_from_file("trbv.fasta")?;
//! builder.compile()?;
//!
//! let mut lib = GermlineLibrary::new(builder.locus(), builder.params().point_names());
//! builder.write_alleles(&mut lib)?;
//! lib.save_to_file("trbv.glib")?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`io`]：FASTA 解析
//! - [`util`]：核酸字母表、翻译、去填充位置映射
//! - [`align`]：突变集合、全局比对、多序列比对排版
//! - [`builder`]：编译器本体
//! - [`library`]：基因库格式与写入

pub mod align;
pub mod builder;
pub mod io;
pub mod library;
pub mod util;
